//! # Fusion Configuration
//!
//! Aggregates the component configs plus the attribute domain enforced by
//! the card program.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CF_ATTRIBUTE_MIN` | `0` | Lowest accepted attribute value |
//! | `CF_ATTRIBUTE_MAX` | `100` | Highest accepted attribute value |
//! | `CF_MOCK_CHAINS` | `31337` | Comma-separated chains served by the local engine |
//! | `CF_ENGINE_INIT_TIMEOUT_MS` | `30000` | Engine connection timeout |
//! | `CF_DECRYPT_TIMEOUT_MS` | `30000` | Per-attempt decryption timeout |
//! | `CF_DECRYPT_MAX_ATTEMPTS` | `3` | Attempts per decryption |
//! | `CF_DECRYPT_BACKOFF_MS` | `500` | Pause between attempts |
//! | `CF_SIGNATURE_VALIDITY_DAYS` | `365` | Authorization validity |
//! | `CF_SIGNATURE_TIMEOUT_MS` | `120000` | Wallet prompt timeout |

use cf_01_encryption_engine::EngineConfig;
use cf_02_signature_cache::SignatureCacheConfig;
use serde::{Deserialize, Serialize};
use shared_types::{ChainId, FieldWidth};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`FusionConfig`].
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values are inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Lowest accepted attribute value (inclusive).
    pub attribute_min: u64,
    /// Highest accepted attribute value (inclusive).
    pub attribute_max: u64,
    /// Width attributes are encrypted at.
    pub attribute_width: FieldWidth,
    /// Engine binding settings.
    pub engine: EngineConfig,
    /// Signature cache settings.
    pub signatures: SignatureCacheConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            attribute_min: 0,
            attribute_max: 100,
            attribute_width: FieldWidth::U32,
            engine: EngineConfig::default(),
            signatures: SignatureCacheConfig::default(),
        }
    }
}

impl FusionConfig {
    /// Create a config for testing (short timeouts, no backoff).
    pub fn for_testing() -> Self {
        Self {
            engine: EngineConfig::for_testing(),
            signatures: SignatureCacheConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `CF_*` environment variables. Unparseable
    /// values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("CF_ATTRIBUTE_MIN", &mut config.attribute_min);
        override_from_env("CF_ATTRIBUTE_MAX", &mut config.attribute_max);
        override_from_env("CF_ENGINE_INIT_TIMEOUT_MS", &mut config.engine.init_timeout_ms);
        override_from_env("CF_DECRYPT_TIMEOUT_MS", &mut config.engine.decrypt_timeout_ms);
        override_from_env(
            "CF_DECRYPT_MAX_ATTEMPTS",
            &mut config.engine.max_decrypt_attempts,
        );
        override_from_env(
            "CF_DECRYPT_BACKOFF_MS",
            &mut config.engine.decrypt_retry_backoff_ms,
        );
        override_from_env(
            "CF_SIGNATURE_VALIDITY_DAYS",
            &mut config.signatures.validity_days,
        );
        override_from_env(
            "CF_SIGNATURE_TIMEOUT_MS",
            &mut config.signatures.signature_timeout_ms,
        );

        if let Ok(raw) = std::env::var("CF_MOCK_CHAINS") {
            match parse_chain_list(&raw) {
                Some(chains) => config.engine.mock_chains = chains,
                None => warn!(value = %raw, "CF_MOCK_CHAINS is not a comma-separated chain list"),
            }
        }

        config
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the attribute domain is non-empty and encodable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attribute_min > self.attribute_max {
            return Err(ConfigError::Invalid(format!(
                "attribute_min {} exceeds attribute_max {}",
                self.attribute_min, self.attribute_max
            )));
        }
        if !self.attribute_width.fits(self.attribute_max) {
            return Err(ConfigError::Invalid(format!(
                "attribute_max {} does not fit {}",
                self.attribute_max, self.attribute_width
            )));
        }
        if self.engine.max_decrypt_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_decrypt_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable environment override"),
        }
    }
}

fn parse_chain_list(raw: &str) -> Option<Vec<ChainId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
