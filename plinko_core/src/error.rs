use crate::round::RoundStatus;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("player seed must not be empty")]
    EmptyPlayerSeed,
    #[error("drop column {drop_column} outside 0..={rows}")]
    DropColumnOutOfRange { drop_column: u32, rows: u32 },
    #[error("rows {rows} outside 1..={max}")]
    RowsOutOfRange { rows: u32, max: u32 },
    #[error("malformed hex: {0}")]
    MalformedHex(#[from] hex::FromHexError),
    #[error("seed must decode to {expected} bytes, got {actual}")]
    SeedLength { expected: usize, actual: usize },
    /// The revealed secret does not hash to the published commitment.
    #[error("integrity violation: reveal does not match commitment for nonce {nonce}")]
    IntegrityViolation { nonce: String },
    #[error("cannot {action} a round in {from} state")]
    InvalidTransition {
        from: RoundStatus,
        action: &'static str,
    },
    #[error("paytable is not symmetric at bin {index}")]
    AsymmetricPaytable { index: usize },
    #[error("paytable with {bins} bins does not fit a {rows}-row board")]
    PaytableRows { rows: u32, bins: usize },
    #[error("paytable must have at least one bin")]
    EmptyPaytable,
    #[error("corrupt round record: {0}")]
    CorruptRecord(String),
}

impl EngineError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, EngineError::IntegrityViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
