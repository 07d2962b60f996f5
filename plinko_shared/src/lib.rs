use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use plinko_core::{DEFAULT_DROP_COLUMN, DEFAULT_ROWS};

pub const DEFAULT_BET_CENTS: i64 = 100;

fn default_drop_column() -> u32 {
    DEFAULT_DROP_COLUMN
}

fn default_bet_cents() -> i64 {
    DEFAULT_BET_CENTS
}

fn default_rows() -> u32 {
    DEFAULT_ROWS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommitResponse {
    pub round_id: i64,
    pub commit_hex: String,
    pub nonce: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StartRequest {
    pub client_seed: String,
    #[serde(default = "default_drop_column")]
    pub drop_column: u32,
    #[serde(default = "default_bet_cents")]
    pub bet_cents: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StartResponse {
    pub round_id: i64,
    pub peg_map_hash: String,
    pub bin_index: u32,
    pub payout_multiplier: f64,
    pub bet_cents: i64,
    pub path: Vec<String>,
    pub rows: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RevealResponse {
    pub round_id: i64,
    pub server_seed: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerifyRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: String,
    #[serde(default = "default_drop_column")]
    pub drop_column: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerifyResponse {
    pub commit_hex: String,
    pub combined_seed: String,
    pub peg_map_hash: String,
    pub bin_index: u32,
    pub path: Vec<String>,
    pub payout_multiplier: f64,
}

/// Public view of a stored round. `server_seed` is present only once revealed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoundView {
    pub round_id: i64,
    pub status: String,
    pub nonce: String,
    pub commit_hex: String,
    pub server_seed: Option<String>,
    pub client_seed: Option<String>,
    pub combined_seed: Option<String>,
    pub peg_map_hash: Option<String>,
    pub path: Option<Vec<String>>,
    pub bin_index: Option<u32>,
    pub drop_column: Option<u32>,
    pub rows: Option<u32>,
    pub bet_cents: Option<i64>,
    pub payout_multiplier: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub revealed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("round not found")]
    NotFound,
    /// Reveal did not match the published commitment.
    #[error("integrity violation")]
    Integrity(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            ApiError::Invalid(d) | ApiError::Integrity(d) | ApiError::Conflict(d) => {
                Some(d.clone())
            }
            ApiError::NotFound | ApiError::Internal => None,
        };
        let error = match self {
            ApiError::Invalid(_) => "invalid request".to_string(),
            ApiError::Conflict(_) => "conflict".to_string(),
            other => other.to_string(),
        };
        ErrorBody { error, details }
    }
}
