//! Engine Configuration Module
//!
//! Loads fee bounds and logging settings from an optional TOML file with
//! `PARITY__`-prefixed environment overrides, e.g. `PARITY__LOGGING__LEVEL=debug`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, Map};
use parity_types::{FeeBounds, FixedPoint};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File read when no explicit path is given; may be absent
pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";

/// Prefix for environment overrides; nested keys are joined with `__`
pub const ENV_PREFIX: &str = "PARITY";

/// Top-level engine configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub fee_bounds: FeeBoundsConfig,
    pub logging: LoggingConfig,
}

/// Accepted swap fee range as decimal fractions
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FeeBoundsConfig {
    pub min: Decimal,
    pub max: Decimal,
}

/// Log filter and output format
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for FeeBoundsConfig {
    fn default() -> Self {
        Self {
            min: Decimal::new(1, 6),
            max: Decimal::new(1, 1),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file with environment overrides
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_PATH`] is
    /// read if present and defaults apply otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let config = Config::builder()
            .add_source(File::from(file).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to build engine configuration")?;

        let engine: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize engine configuration")?;

        // Reject unusable bounds at load time rather than on first swap
        engine.fee_bounds()?;

        debug!(
            file = %file.display(),
            fee_min = %engine.fee_bounds.min,
            fee_max = %engine.fee_bounds.max,
            "engine configuration loaded"
        );
        Ok(engine)
    }

    /// Fee bounds as 18-decimal fixed point
    pub fn fee_bounds(&self) -> Result<FeeBounds> {
        let min = FixedPoint::from_decimal(self.fee_bounds.min)
            .with_context(|| format!("Invalid fee_bounds.min {}", self.fee_bounds.min))?;
        let max = FixedPoint::from_decimal(self.fee_bounds.max)
            .with_context(|| format!("Invalid fee_bounds.max {}", self.fee_bounds.max))?;
        FeeBounds::new(min, max).context("Invalid [fee_bounds] section")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_engine_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");

        let config_content = r#"
[fee_bounds]
min = 0.0001
max = 0.05

[logging]
level = "parity_amm=debug"
json = true
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = EngineConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.fee_bounds.min, Decimal::new(1, 4));
        assert_eq!(config.fee_bounds.max, Decimal::new(5, 2));
        assert_eq!(config.logging.level, "parity_amm=debug");
        assert!(config.logging.json);

        let bounds = config.fee_bounds().unwrap();
        assert_eq!(bounds.min, FixedPoint::from_raw_u128(100_000_000_000_000));
        assert_eq!(bounds.max, FixedPoint::from_raw_u128(50_000_000_000_000_000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");
        fs::write(&config_path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let config = EngineConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.fee_bounds, FeeBoundsConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
        assert_eq!(config.fee_bounds().unwrap(), FeeBounds::default());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(EngineConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");
        fs::write(&config_path, "[fee_bounds]\nmax = 0.05\n").unwrap();

        let env = Map::from([
            ("PARITY__FEE_BOUNDS__MAX".to_string(), "0.02".to_string()),
            ("PARITY__LOGGING__JSON".to_string(), "true".to_string()),
        ]);
        let config = EngineConfig::load_with_env(Some(&config_path), Some(env)).unwrap();

        assert_eq!(config.fee_bounds.max, Decimal::new(2, 2));
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_fee_bounds_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");

        fs::write(&config_path, "[fee_bounds]\nmin = 0.2\nmax = 0.1\n").unwrap();
        assert!(EngineConfig::load(Some(&config_path)).is_err());

        fs::write(&config_path, "[fee_bounds]\nmin = 0.01\nmax = 1\n").unwrap();
        assert!(EngineConfig::load(Some(&config_path)).is_err());
    }
}
