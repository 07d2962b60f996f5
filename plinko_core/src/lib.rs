pub mod combiner;
pub mod commitment;
pub mod engine;
pub mod error;
pub mod hash;
pub mod paytable;
pub mod rng;
pub mod round;

pub use crate::combiner::{combine, extract_seed32};
pub use crate::commitment::{
    commit_hex, create_commitment, verify_reveal, Commitment, NonceSource, ServerSecret,
};
pub use crate::engine::{
    begin_round, path_string, play_round, reveal_round, simulate, simulate_combined, verify_round,
    BegunRound, DropOutcome, EngineParams, PegMap, PlayOutcome, Step, Verification,
    DEFAULT_DROP_COLUMN, DEFAULT_ROWS, MAX_ROWS,
};
pub use crate::error::{EngineError, Result};
pub use crate::hash::sha256_hex;
pub use crate::paytable::{Paytable, FALLBACK_MULTIPLIER, STANDARD_MULTIPLIERS};
pub use crate::rng::XorShift32;
pub use crate::round::{PublicRound, Round, RoundPlay, RoundStatus};
