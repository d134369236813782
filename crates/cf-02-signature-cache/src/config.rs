//! # Signature Cache Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

const SECS_PER_DAY: u64 = 86_400;

/// Signature cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignatureCacheConfig {
    /// Validity window of a new authorization, in days.
    pub validity_days: u64,

    /// How long to wait for the wallet to answer a signature prompt, in
    /// milliseconds. An unanswered prompt counts as declined.
    pub signature_timeout_ms: u64,
}

impl Default for SignatureCacheConfig {
    fn default() -> Self {
        Self {
            validity_days: 365,
            signature_timeout_ms: 120_000,
        }
    }
}

impl SignatureCacheConfig {
    /// Create a config for testing (short prompt timeout).
    pub fn for_testing() -> Self {
        Self {
            validity_days: 365,
            signature_timeout_ms: 200,
        }
    }

    /// Validity window in seconds.
    pub fn validity_secs(&self) -> u64 {
        self.validity_days.saturating_mul(SECS_PER_DAY)
    }

    /// Signature prompt timeout.
    pub fn signature_timeout(&self) -> Duration {
        Duration::from_millis(self.signature_timeout_ms)
    }
}
