use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    combiner::{combine, extract_seed32},
    commitment::{
        commit_hex, create_commitment, verify_reveal, Commitment, NonceSource, ServerSecret,
    },
    error::{EngineError, Result},
    hash::sha256_hex,
    paytable::Paytable,
    rng::XorShift32,
};

pub const DEFAULT_ROWS: u32 = 12;
pub const DEFAULT_DROP_COLUMN: u32 = 6;
pub const MAX_ROWS: u32 = 32;

const BIAS_CENTER: f64 = 0.5;
const BIAS_SPREAD: f64 = 0.2; // +/-10% around the center
const BIAS_DECIMALS: u32 = 6;
const DROP_COLUMN_STEP: f64 = 0.01;

// Longest terminating decimal fraction of any finite f64 (2^-1074).
const EXACT_FRACTION_DIGITS: usize = 1074;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Step {
    pub fn as_char(self) -> char {
        match self {
            Step::Left => 'L',
            Step::Right => 'R',
        }
    }
}

/// `"LRRL..."` form of a path.
pub fn path_string(path: &[Step]) -> String {
    path.iter().map(|s| s.as_char()).collect()
}

/// Rounds to `decimals` fractional digits with the semantics of ECMAScript
/// `Number.prototype.toFixed`: the exact binary value is rounded, ties go
/// away from zero, and the result is the nearest f64 to that decimal.
///
/// Valid while `|value| * 10^decimals < 2^53` and `decimals <= 15`.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let cut = decimals as usize;
    let kept = fraction.get(..cut).unwrap_or(fraction);
    let mut scaled = whole
        .bytes()
        .chain(kept.bytes())
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d - b'0')));
    if fraction.as_bytes().get(cut).is_some_and(|d| *d >= b'5') {
        scaled = scaled.saturating_add(1);
    }
    (scaled as f64 / 10u64.pow(decimals) as f64).copysign(value)
}

/// Triangular peg-bias map. Row `r` holds `r + 1` probabilities that the
/// ball deflects left at that peg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PegMap(Vec<Vec<f64>>);

impl PegMap {
    /// Consumes `rows * (rows + 1) / 2` generator values, row by row.
    pub fn generate(rng: &mut XorShift32, rows: u32) -> Self {
        let rows: Vec<Vec<f64>> = (0..rows as usize)
            .map(|r| {
                (0..=r)
                    .map(|_| {
                        let raw = BIAS_CENTER + (rng.next_f64() - BIAS_CENTER) * BIAS_SPREAD;
                        round_half_up(raw, BIAS_DECIMALS)
                    })
                    .collect()
            })
            .collect();
        Self(rows)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.0
    }

    pub fn bias(&self, row: usize, peg: usize) -> Option<f64> {
        self.0.get(row).and_then(|r| r.get(peg)).copied()
    }

    /// Hashed encoding: `[[a],[b,c],...]` with no whitespace, each number in
    /// shortest round-trip decimal form without exponent (`0.5339`, `0.5`).
    /// Identical to `JSON.stringify` output for values in [0, 1].
    pub fn canonical_json(&self) -> String {
        let mut out = String::from("[");
        for (r, row) in self.0.iter().enumerate() {
            if r > 0 {
                out.push(',');
            }
            out.push('[');
            for (p, bias) in row.iter().enumerate() {
                if p > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{bias}");
            }
            out.push(']');
        }
        out.push(']');
        out
    }

    pub fn hash_hex(&self) -> String {
        sha256_hex(self.canonical_json())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub peg_map: PegMap,
    pub peg_map_hash: String,
    pub path: Vec<Step>,
    pub bin_index: u32,
}

/// Builds the peg map, then drops one ball through it from the same
/// generator stream: one extra draw per row.
pub fn simulate(rng: &mut XorShift32, rows: u32, drop_column: u32) -> DropOutcome {
    let peg_map = PegMap::generate(rng, rows);
    let peg_map_hash = peg_map.hash_hex();
    let adjustment = (i64::from(drop_column) - i64::from(rows / 2)) as f64 * DROP_COLUMN_STEP;

    let (path, bin_index) = walk_path(&peg_map, adjustment, rng);

    DropOutcome {
        peg_map,
        peg_map_hash,
        path,
        bin_index,
    }
}

/// Drops the ball through `peg_map`, one draw per row. The left probability
/// saturates at 0 and 1.
fn walk_path(peg_map: &PegMap, adjustment: f64, rng: &mut XorShift32) -> (Vec<Step>, u32) {
    let mut position = 0usize;
    let mut path = Vec::with_capacity(peg_map.rows().len());
    for (r, row) in peg_map.rows().iter().enumerate() {
        let bias = row[position.min(r)];
        let left_probability = (bias + adjustment).clamp(0.0, 1.0);
        if rng.next_f64() < left_probability {
            path.push(Step::Left);
        } else {
            path.push(Step::Right);
            position += 1;
        }
    }
    (path, position as u32)
}

/// Convenience: seed the generator from a combined seed and simulate.
pub fn simulate_combined(
    combined_seed_hex: &str,
    rows: u32,
    drop_column: u32,
) -> Result<DropOutcome> {
    check_rows(rows)?;
    check_drop_column(drop_column, rows)?;
    let mut rng = XorShift32::new(extract_seed32(combined_seed_hex)?);
    Ok(simulate(&mut rng, rows, drop_column))
}

fn check_rows(rows: u32) -> Result<()> {
    if rows == 0 || rows > MAX_ROWS {
        return Err(EngineError::RowsOutOfRange { rows, max: MAX_ROWS });
    }
    Ok(())
}

fn check_drop_column(drop_column: u32, rows: u32) -> Result<()> {
    if drop_column > rows {
        return Err(EngineError::DropColumnOutOfRange { drop_column, rows });
    }
    Ok(())
}

fn check_paytable(rows: u32, paytable: &Paytable) -> Result<()> {
    if paytable.rows() != rows {
        return Err(EngineError::PaytableRows {
            rows,
            bins: paytable.multipliers().len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub rows: u32,
    pub paytable: Paytable,
}

impl EngineParams {
    /// `paytable` must have exactly `rows + 1` bins.
    pub fn new(rows: u32, paytable: Paytable) -> Result<Self> {
        check_rows(rows)?;
        check_paytable(rows, &paytable)?;
        Ok(Self { rows, paytable })
    }

    fn validate(&self, player_seed: &str, drop_column: u32) -> Result<()> {
        if player_seed.is_empty() {
            return Err(EngineError::EmptyPlayerSeed);
        }
        check_rows(self.rows)?;
        check_paytable(self.rows, &self.paytable)?;
        check_drop_column(drop_column, self.rows)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            paytable: Paytable::standard(),
        }
    }
}

/// Commit phase result. Only `commitment` may leave the server before reveal.
#[derive(Debug, Clone)]
pub struct BegunRound {
    pub secret: ServerSecret,
    pub commitment: Commitment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub combined_seed: String,
    pub peg_map_hash: String,
    pub path: Vec<Step>,
    pub bin_index: u32,
    pub payout_multiplier: f64,
    pub peg_map: PegMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub commit_hex: String,
    pub combined_seed: String,
    pub peg_map_hash: String,
    pub bin_index: u32,
    pub path: Vec<Step>,
    pub payout_multiplier: f64,
}

pub fn begin_round(nonces: &NonceSource) -> BegunRound {
    let (secret, commitment) = create_commitment(nonces);
    BegunRound { secret, commitment }
}

/// Start phase. Inputs are validated before any hashing happens.
pub fn play_round(
    secret: &str,
    nonce: &str,
    player_seed: &str,
    drop_column: u32,
    params: &EngineParams,
) -> Result<PlayOutcome> {
    params.validate(player_seed, drop_column)?;
    let combined_seed = combine(secret, player_seed, nonce);
    let mut rng = XorShift32::new(extract_seed32(&combined_seed)?);
    let DropOutcome {
        peg_map,
        peg_map_hash,
        path,
        bin_index,
    } = simulate(&mut rng, params.rows, drop_column);
    let payout_multiplier = params.paytable.resolve(bin_index);
    debug!(nonce, bin_index, payout_multiplier, %peg_map_hash, "round played");
    Ok(PlayOutcome {
        combined_seed,
        peg_map_hash,
        path,
        bin_index,
        payout_multiplier,
        peg_map,
    })
}

/// Reveal check. The secret may be disclosed only when this returns `true`.
pub fn reveal_round(secret: &str, nonce: &str, commitment: &str) -> bool {
    verify_reveal(secret, nonce, commitment)
}

/// Third-party re-derivation from public values plus the revealed secret.
pub fn verify_round(
    secret: &str,
    nonce: &str,
    player_seed: &str,
    drop_column: u32,
    params: &EngineParams,
) -> Result<Verification> {
    let outcome = play_round(secret, nonce, player_seed, drop_column, params)?;
    Ok(Verification {
        commit_hex: commit_hex(secret, nonce),
        combined_seed: outcome.combined_seed,
        peg_map_hash: outcome.peg_map_hash,
        bin_index: outcome.bin_index,
        path: outcome.path,
        payout_multiplier: outcome.payout_multiplier,
    })
}
