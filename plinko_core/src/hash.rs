use sha2::{Digest, Sha256};

/// Field separator used by every hashed protocol message.
pub const FIELD_SEPARATOR: &str = ":";

/// SHA-256 of `input` as lowercase hex (64 chars).
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_ref());
    hex::encode(hasher.finalize())
}

/// Digest of `parts` joined with `:`; the input text for commitments and
/// combined seeds.
pub fn digest_fields(parts: &[&str]) -> String {
    sha256_hex(parts.join(FIELD_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fields_are_colon_joined() {
        assert_eq!(digest_fields(&["a", "b", "c"]), sha256_hex("a:b:c"));
        assert_ne!(digest_fields(&["ab", "c"]), digest_fields(&["a", "bc"]));
    }
}
