//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Deployment environment label (local, testnet, mainnet)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "card-fusion".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "local".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CF_SERVICE_NAME`: Service name (default: card-fusion)
    /// - `CF_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CF_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `CF_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `CF_ENVIRONMENT`: Environment label (default: local)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CF_SERVICE_NAME")
                .unwrap_or_else(|_| "card-fusion".to_string()),

            log_level: env::var("CF_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("CF_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("CF_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            environment: env::var("CF_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
        }
    }

    /// Configuration for a named component, e.g. `for_component("cf-demo")`.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("card-fusion-{}", component);
        config
    }
}
