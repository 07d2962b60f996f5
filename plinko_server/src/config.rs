use anyhow::Context;
use plinko_core::{EngineParams, Paytable};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://plinko.db?mode=rwc";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind: String,
    pub rows: u32,
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let rows = match lookup("PLINKO_ROWS") {
            Some(v) => v.trim().parse().context("PLINKO_ROWS must be an integer")?,
            None => plinko_core::DEFAULT_ROWS,
        };
        let max_connections = match lookup("PLINKO_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse()
                .context("PLINKO_MAX_CONNECTIONS must be an integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind: lookup("BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            rows,
            max_connections,
        })
    }

    /// Only board sizes with a paytable are servable; today that is the
    /// standard 12-row table.
    pub fn engine_params(&self) -> anyhow::Result<EngineParams> {
        EngineParams::new(self.rows, Paytable::standard())
            .with_context(|| format!("PLINKO_ROWS={} has no paytable", self.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.rows, 12);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("BIND", "0.0.0.0:9000"),
            ("PLINKO_ROWS", "8"),
        ]))
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.rows, 8);
        assert!(ServerConfig::from_lookup(lookup(&[("PLINKO_ROWS", "twelve")])).is_err());
    }

    #[test]
    fn rows_without_paytable_are_rejected() {
        let config = ServerConfig::from_lookup(lookup(&[("PLINKO_ROWS", "8")])).unwrap();
        assert!(config.engine_params().is_err());
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        let params = config.engine_params().unwrap();
        assert_eq!(params.rows, 12);
        assert_eq!(params.paytable.resolve(0), params.paytable.resolve(12));
    }
}
