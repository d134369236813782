//! # Fusion Telemetry
//!
//! Observability for the card-fusion stack.
//!
//! ## Components
//!
//! - **Logs**: `tracing` + `tracing-subscriber` (pretty or JSON, `EnvFilter`)
//! - **Metrics**: Prometheus counters exposed via [`encode_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fusion_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CF_SERVICE_NAME` | `card-fusion` | Service name in logs |
//! | `CF_LOG_LEVEL` | `info` | Log level filter |
//! | `CF_JSON_LOGS` | `false` | JSON log output |
//! | `CF_ENVIRONMENT` | `local` | Environment label |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, AUTHORIZATION_CACHE_HITS, CARDS_FUSED,
    CARDS_MINTED, CARDS_REVEALED, CONSISTENCY_ANOMALIES, DECRYPT_RETRIES, ENGINE_INITIALIZATIONS,
    OPERATIONS, OWNED_CARDS, SIGNATURE_PROMPTS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Global subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first (no global side effects beyond the registry)
    let metrics_handle = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
