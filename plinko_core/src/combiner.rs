use crate::error::{EngineError, Result};
use crate::hash::digest_fields;

/// A combined seed is a SHA-256 digest.
pub const COMBINED_SEED_BYTES: usize = 32;

/// `sha256("{secret}:{player_seed}:{nonce}")`
pub fn combine(secret: &str, player_seed: &str, nonce: &str) -> String {
    digest_fields(&[secret, player_seed, nonce])
}

/// First 4 bytes of the combined seed, big-endian. Only these 32 bits feed
/// the generator.
pub fn extract_seed32(combined_seed_hex: &str) -> Result<u32> {
    let bytes = hex::decode(combined_seed_hex)?;
    if bytes.len() != COMBINED_SEED_BYTES {
        return Err(EngineError::SeedLength {
            expected: COMBINED_SEED_BYTES,
            actual: bytes.len(),
        });
    }
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
