use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::hash::digest_fields;

/// Bytes of OS entropy in a server secret.
pub const SECRET_BYTES: usize = 32;

/// Server secret, hex text. Kept opaque in `Debug` output so it cannot leak
/// through logs before reveal.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSecret(String);

impl ServerSecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret(<sealed>)")
    }
}

/// Public half of a round's commit phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub nonce: String,
    pub commit_hex: String,
}

impl Commitment {
    pub fn for_secret(secret: &str, nonce: impl Into<String>) -> Self {
        let nonce = nonce.into();
        Self {
            commit_hex: commit_hex(secret, &nonce),
            nonce,
        }
    }
}

/// `sha256("{secret}:{nonce}")`
pub fn commit_hex(secret: &str, nonce: &str) -> String {
    digest_fields(&[secret, nonce])
}

/// Strictly increasing millisecond nonces. Starts from wall-clock time and
/// bumps by one when asked twice within the same millisecond.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after `last`, e.g. the highest nonce already persisted.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    pub fn next_nonce(&self) -> String {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        self.next_after_clock(now).to_string()
    }

    fn next_after_clock(&self, now: u64) -> u64 {
        let bump = |last: u64| now.max(last.saturating_add(1));
        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        bump(previous)
    }
}

/// Commit phase: fresh secret, fresh nonce, and the digest binding them.
/// Only the `Commitment` may be disclosed before reveal.
pub fn create_commitment(nonces: &NonceSource) -> (ServerSecret, Commitment) {
    let secret = ServerSecret::generate();
    let commitment = Commitment::for_secret(secret.expose(), nonces.next_nonce());
    (secret, commitment)
}

/// `false` means the secret was swapped after commit or the record is
/// corrupt; callers must not treat it as an ordinary error.
pub fn verify_reveal(secret: &str, nonce: &str, commit: &str) -> bool {
    commit_hex(secret, nonce) == commit
}
