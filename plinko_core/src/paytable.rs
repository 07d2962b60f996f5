use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Multipliers for bins 0..=12 of the standard 12-row board.
pub const STANDARD_MULTIPLIERS: [f64; 13] = [
    9.0, 6.0, 4.0, 3.0, 2.0, 1.5, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 9.0,
];

/// Returned for a bin the table does not cover.
pub const FALLBACK_MULTIPLIER: f64 = 1.0;

/// Symmetric bin -> multiplier table: `table[i] == table[len - 1 - i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Paytable(Vec<f64>);

impl Paytable {
    pub fn new(multipliers: Vec<f64>) -> Result<Self> {
        if multipliers.is_empty() {
            return Err(EngineError::EmptyPaytable);
        }
        let last = multipliers.len() - 1;
        if let Some(index) = (0..multipliers.len()).find(|&i| multipliers[i] != multipliers[last - i])
        {
            return Err(EngineError::AsymmetricPaytable { index });
        }
        Ok(Self(multipliers))
    }

    pub fn standard() -> Self {
        Self(STANDARD_MULTIPLIERS.to_vec())
    }

    /// Highest bin index covered, i.e. the row count this table was made for.
    pub fn rows(&self) -> u32 {
        u32::try_from(self.0.len() - 1).unwrap_or(u32::MAX)
    }

    pub fn multipliers(&self) -> &[f64] {
        &self.0
    }

    pub fn resolve(&self, bin_index: u32) -> f64 {
        usize::try_from(bin_index)
            .ok()
            .and_then(|i| self.0.get(i))
            .copied()
            .unwrap_or(FALLBACK_MULTIPLIER)
    }
}

impl Default for Paytable {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for Paytable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let multipliers = Vec::<f64>::deserialize(deserializer)?;
        Paytable::new(multipliers).map_err(serde::de::Error::custom)
    }
}
