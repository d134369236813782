//! # Engine Configuration
//!
//! Configuration for the Encryption Engine Binding.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, HARDHAT_CHAIN_ID};
use std::time::Duration;

/// Encryption engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chains served by the local development runtime instead of the full
    /// engine. Callers see the same contract either way.
    pub mock_chains: Vec<ChainId>,

    /// Upper bound for establishing an engine connection, in milliseconds.
    pub init_timeout_ms: u64,

    /// Upper bound for a single decryption attempt, in milliseconds.
    pub decrypt_timeout_ms: u64,

    /// Attempts per decryption request (first try included). Only transient
    /// failures are retried.
    pub max_decrypt_attempts: u32,

    /// Pause between decryption attempts, in milliseconds.
    pub decrypt_retry_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mock_chains: vec![HARDHAT_CHAIN_ID],
            init_timeout_ms: 30_000,
            decrypt_timeout_ms: 30_000,
            max_decrypt_attempts: 3,
            decrypt_retry_backoff_ms: 500,
        }
    }
}

impl EngineConfig {
    /// Create a config for testing (short timeouts, no backoff).
    pub fn for_testing() -> Self {
        Self {
            mock_chains: vec![HARDHAT_CHAIN_ID],
            init_timeout_ms: 1_000,
            decrypt_timeout_ms: 500,
            max_decrypt_attempts: 3,
            decrypt_retry_backoff_ms: 0,
        }
    }

    /// Whether `chain_id` is served by the local runtime.
    pub fn is_mock_chain(&self, chain_id: ChainId) -> bool {
        self.mock_chains.contains(&chain_id)
    }

    /// Initialization timeout.
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// Per-attempt decryption timeout.
    pub fn decrypt_timeout(&self) -> Duration {
        Duration::from_millis(self.decrypt_timeout_ms)
    }

    /// Backoff between decryption attempts.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.decrypt_retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.is_mock_chain(31337));
        assert!(!config.is_mock_chain(11_155_111));
        assert_eq!(config.max_decrypt_attempts, 3);
    }

    #[test]
    fn test_testing_config() {
        let config = EngineConfig::for_testing();
        assert_eq!(config.retry_backoff(), Duration::ZERO);
        assert_eq!(config.decrypt_timeout(), Duration::from_millis(500));
    }
}
