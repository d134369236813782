//! Prometheus metrics for the card-fusion components.
//!
//! All metrics follow the naming convention: `cf_<component>_<metric>_<unit>`
//!
//! Counters are usable before [`register_metrics`] runs; registration only
//! makes them visible to [`encode_metrics`].

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ENGINE METRICS (cf-01)
    // =========================================================================

    /// Engine initializations by outcome
    pub static ref ENGINE_INITIALIZATIONS: CounterVec = CounterVec::new(
        Opts::new("cf_engine_initializations_total", "Engine initializations by outcome"),
        &["runtime", "outcome"]  // runtime: local/full, outcome: ready/error/superseded
    ).expect("metric creation failed");

    /// Decryption attempts retried after a transient failure
    pub static ref DECRYPT_RETRIES: Counter = Counter::new(
        "cf_engine_decrypt_retries_total",
        "Decryption attempts retried after a transient failure"
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNATURE CACHE METRICS (cf-02)
    // =========================================================================

    /// Signature prompts issued to the wallet
    pub static ref SIGNATURE_PROMPTS: CounterVec = CounterVec::new(
        Opts::new("cf_signatures_prompts_total", "Signature prompts issued to the wallet"),
        &["outcome"]  // signed/declined/timeout
    ).expect("metric creation failed");

    /// Authorization cache hits
    pub static ref AUTHORIZATION_CACHE_HITS: Counter = Counter::new(
        "cf_signatures_cache_hits_total",
        "Decryption authorizations served from cache"
    ).expect("metric creation failed");

    // =========================================================================
    // CONTROLLER METRICS (cf-04)
    // =========================================================================

    /// Operations by kind and outcome
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("cf_controller_operations_total", "Operations by kind and outcome"),
        &["operation", "outcome"]  // operation: mint/fuse/decrypt/refresh
    ).expect("metric creation failed");

    /// Cards minted
    pub static ref CARDS_MINTED: Counter = Counter::new(
        "cf_controller_cards_minted_total",
        "Cards observed after a successful mint"
    ).expect("metric creation failed");

    /// Cards fused
    pub static ref CARDS_FUSED: Counter = Counter::new(
        "cf_controller_cards_fused_total",
        "Fusions reconciled successfully"
    ).expect("metric creation failed");

    /// Cards revealed
    pub static ref CARDS_REVEALED: Counter = Counter::new(
        "cf_controller_cards_revealed_total",
        "Cards whose four attributes were decrypted"
    ).expect("metric creation failed");

    /// Consistency anomalies detected during reconciliation
    pub static ref CONSISTENCY_ANOMALIES: Counter = Counter::new(
        "cf_controller_consistency_anomalies_total",
        "Post-operation ledger states that did not match expectations"
    ).expect("metric creation failed");

    /// Cards currently owned by the session account
    pub static ref OWNED_CARDS: IntGauge = IntGauge::new(
        "cf_registry_owned_cards",
        "Cards owned by the active account after the last refresh"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Engine
        Box::new(ENGINE_INITIALIZATIONS.clone()),
        Box::new(DECRYPT_RETRIES.clone()),
        // Signatures
        Box::new(SIGNATURE_PROMPTS.clone()),
        Box::new(AUTHORIZATION_CACHE_HITS.clone()),
        // Controller
        Box::new(OPERATIONS.clone()),
        Box::new(CARDS_MINTED.clone()),
        Box::new(CARDS_FUSED.clone()),
        Box::new(CARDS_REVEALED.clone()),
        Box::new(CONSISTENCY_ANOMALIES.clone()),
        Box::new(OWNED_CARDS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all registered metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
