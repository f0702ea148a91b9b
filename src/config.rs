//! Store configuration.

use serde::Deserialize;

/// Environment variable consulted by [`StoreConfig::from_env`].
pub const ENV_VAR: &str = "SELECTREE_ENV";

const DEFAULT_MAX_TICKS: usize = 1024;

/// Runtime knobs for a [`Store`](crate::Store).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Emit developer warnings for suspicious selectors and dropped writes.
    pub dev_warnings: bool,
    /// Upper bound on ticks run by a single `run_until_idle` call.
    pub max_ticks: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dev_warnings: cfg!(debug_assertions),
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl StoreConfig {
    /// Defaults, with developer warnings switched off when
    /// `SELECTREE_ENV=production`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if std::env::var(ENV_VAR).is_ok_and(|env| env == "production") {
            config.dev_warnings = false;
        }
        config
    }

    /// Configuration for production builds: no developer warnings.
    pub fn production() -> Self {
        Self {
            dev_warnings: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"max_ticks": 8}"#).unwrap();
        assert_eq!(config.max_ticks, 8);
        assert_eq!(config.dev_warnings, StoreConfig::default().dev_warnings);
    }

    #[test]
    fn production_disables_warnings() {
        assert!(!StoreConfig::production().dev_warnings);
    }
}
