//! # Engine Binding Service
//!
//! Owns at most one engine instance at a time, bound to one
//! `(chain, program)` target.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──► Initializing ──► Ready
//!       ▲                            │
//!       │                            └─────────► Error
//!       └──────────── teardown ◄─────────────────┘
//! ```
//!
//! Every `initialize` for a new target bumps a generation counter. A
//! connection that completes under an older generation is discarded and its
//! caller receives `EngineError::Init("... superseded")`.

use crate::config::EngineConfig;
use crate::domain::{
    check_authorization_live, check_encodable, EngineError, EngineResult, EngineTarget,
};
use crate::ports::{EncryptionEngineApi, FheFailure, FheInstance, FheRuntime};
use async_trait::async_trait;
use fusion_telemetry::{log_event, metric_inc, DECRYPT_RETRIES, ENGINE_INITIALIZATIONS};
use parking_lot::RwLock;
use shared_bus::{EventPublisher, FusionEvent};
use shared_types::{
    Address, ChainId, CiphertextHandle, Clock, DecryptionAuthorization, EngineStatus, FieldWidth,
    WalletProvider,
};
use std::sync::Arc;
use tokio::sync::watch;

const COMPONENT: &str = "cf-01";

/// Engine runtimes available to the binding.
#[derive(Clone)]
pub struct EngineRuntimes {
    /// Runtime for chains listed in `EngineConfig::mock_chains`.
    pub local: Arc<dyn FheRuntime>,
    /// Network runtime for every other chain. Without one, initialization
    /// on a non-development chain fails.
    pub full: Option<Arc<dyn FheRuntime>>,
}

impl EngineRuntimes {
    /// Only the local runtime is available.
    pub fn local_only(local: Arc<dyn FheRuntime>) -> Self {
        Self { local, full: None }
    }

    /// Local runtime plus a network runtime.
    pub fn with_full(local: Arc<dyn FheRuntime>, full: Arc<dyn FheRuntime>) -> Self {
        Self {
            local,
            full: Some(full),
        }
    }
}

struct BindingState {
    generation: u64,
    target: Option<EngineTarget>,
    instance: Option<Arc<dyn FheInstance>>,
}

/// Encryption Engine Binding.
pub struct EngineBinding {
    config: EngineConfig,
    runtimes: EngineRuntimes,
    clock: Arc<dyn Clock>,
    publisher: Arc<dyn EventPublisher>,
    state: RwLock<BindingState>,
    status_tx: watch::Sender<EngineStatus>,
}

impl EngineBinding {
    /// Create an uninitialized binding.
    pub fn new(
        config: EngineConfig,
        runtimes: EngineRuntimes,
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let (status_tx, _) = watch::channel(EngineStatus::Uninitialized);
        Self {
            config,
            runtimes,
            clock,
            publisher,
            state: RwLock::new(BindingState {
                generation: 0,
                target: None,
                instance: None,
            }),
            status_tx,
        }
    }

    /// Watch status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn runtime_for(&self, chain_id: ChainId) -> Result<Arc<dyn FheRuntime>, String> {
        if self.config.is_mock_chain(chain_id) {
            return Ok(Arc::clone(&self.runtimes.local));
        }
        self.runtimes
            .full
            .clone()
            .ok_or_else(|| format!("no engine runtime configured for chain {chain_id}"))
    }

    /// Claim the binding for `target`. Must be called with the state lock held.
    fn begin(&self, state: &mut BindingState, target: EngineTarget) -> u64 {
        state.generation += 1;
        state.target = Some(target);
        state.instance = None;
        self.status_tx.send_replace(EngineStatus::Initializing);
        state.generation
    }

    async fn announce(&self, target: EngineTarget, status: EngineStatus) {
        self.publisher
            .publish(FusionEvent::EngineStatusChanged {
                chain_id: target.chain_id,
                program: target.program,
                status,
            })
            .await;
    }

    /// Join an initialization already running for `target`.
    async fn await_inflight(&self, target: EngineTarget) -> EngineResult<()> {
        let mut status_rx = self.status_tx.subscribe();
        loop {
            {
                let state = self.state.read();
                if state.target != Some(target) {
                    return Err(EngineError::Init(format!(
                        "initialization for {target} superseded"
                    )));
                }
                match &*status_rx.borrow_and_update() {
                    EngineStatus::Ready => return Ok(()),
                    EngineStatus::Error(reason) => return Err(EngineError::Init(reason.clone())),
                    EngineStatus::Uninitialized => {
                        return Err(EngineError::Init(format!(
                            "initialization for {target} cancelled"
                        )))
                    }
                    EngineStatus::Initializing => {}
                }
            }
            if status_rx.changed().await.is_err() {
                return Err(EngineError::Init("engine binding dropped".to_string()));
            }
        }
    }

    async fn connect(
        &self,
        target: &EngineTarget,
        wallet: Arc<dyn WalletProvider>,
    ) -> (&'static str, Result<Arc<dyn FheInstance>, String>) {
        let runtime = match self.runtime_for(target.chain_id) {
            Ok(runtime) => runtime,
            Err(reason) => return ("none", Err(reason)),
        };
        let name = runtime.name();
        let outcome =
            match tokio::time::timeout(self.config.init_timeout(), runtime.connect(target, wallet))
                .await
            {
                Ok(Ok(instance)) => Ok(instance),
                Ok(Err(failure)) => Err(failure.to_string()),
                Err(_) => Err(format!(
                    "timed out after {}ms",
                    self.config.init_timeout_ms
                )),
            };
        (name, outcome)
    }

    fn ready_instance(&self) -> EngineResult<Arc<dyn FheInstance>> {
        let state = self.state.read();
        let status = self.status_tx.borrow().clone();
        match (&state.instance, status.is_ready()) {
            (Some(instance), true) => Ok(Arc::clone(instance)),
            _ => Err(EngineError::NotReady(format!("engine is {}", status.label()))),
        }
    }
}

#[async_trait]
impl EncryptionEngineApi for EngineBinding {
    async fn initialize(
        &self,
        chain_id: ChainId,
        program: Address,
        wallet: Arc<dyn WalletProvider>,
    ) -> EngineResult<()> {
        let target = EngineTarget::new(chain_id, program)?;

        let generation = {
            let mut state = self.state.write();
            let status = self.status_tx.borrow().clone();
            match (state.target == Some(target), status) {
                (true, EngineStatus::Ready) => return Ok(()),
                (true, EngineStatus::Initializing) => None,
                _ => Some(self.begin(&mut state, target)),
            }
        };
        let Some(generation) = generation else {
            log_event!(debug, COMPONENT, "joining in-flight initialization", engine = %target);
            return self.await_inflight(target).await;
        };

        log_event!(info, COMPONENT, "initializing engine", engine = %target, generation);
        self.announce(target, EngineStatus::Initializing).await;

        let (runtime, outcome) = self.connect(&target, wallet).await;

        let status = {
            let mut state = self.state.write();
            if state.generation != generation {
                metric_inc!(ENGINE_INITIALIZATIONS, &[runtime, "superseded"]);
                log_event!(info, COMPONENT, "discarding superseded engine", engine = %target);
                return Err(EngineError::Init(format!(
                    "initialization for {target} superseded"
                )));
            }
            let status = match &outcome {
                Ok(instance) => {
                    state.instance = Some(Arc::clone(instance));
                    EngineStatus::Ready
                }
                Err(reason) => {
                    state.instance = None;
                    EngineStatus::Error(reason.clone())
                }
            };
            self.status_tx.send_replace(status.clone());
            status
        };

        match &outcome {
            Ok(_) => {
                metric_inc!(ENGINE_INITIALIZATIONS, &[runtime, "ready"]);
                log_event!(info, COMPONENT, "engine ready", engine = %target, runtime);
            }
            Err(reason) => {
                metric_inc!(ENGINE_INITIALIZATIONS, &[runtime, "error"]);
                log_event!(warn, COMPONENT, "engine initialization failed", engine = %target, reason = %reason);
            }
        }
        self.announce(target, status).await;

        outcome.map(|_| ()).map_err(EngineError::Init)
    }

    async fn encrypt(
        &self,
        value: u64,
        width: FieldWidth,
        user: Address,
    ) -> EngineResult<CiphertextHandle> {
        check_encodable(value, width)?;
        let instance = self.ready_instance()?;
        instance.encrypt(value, width, user).await.map_err(|failure| match failure {
            FheFailure::AccessDenied(reason) => EngineError::DecryptionRejected(reason),
            other => EngineError::NotReady(other.to_string()),
        })
    }

    async fn request_decryption(
        &self,
        handle: CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> EngineResult<u64> {
        let instance = self.ready_instance()?;
        let attempts = self.config.max_decrypt_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=attempts {
            check_authorization_live(authorization, self.clock.now_secs())?;

            let result = tokio::time::timeout(
                self.config.decrypt_timeout(),
                instance.user_decrypt(handle, authorization),
            )
            .await;

            match result {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(FheFailure::AccessDenied(reason))) => {
                    return Err(EngineError::DecryptionRejected(reason))
                }
                Ok(Err(FheFailure::Transient(reason))) => last_failure = reason,
                Ok(Err(other)) => return Err(EngineError::NotReady(other.to_string())),
                Err(_) => {
                    last_failure = format!("attempt timed out after {}ms", self.config.decrypt_timeout_ms)
                }
            }

            if attempt < attempts {
                metric_inc!(DECRYPT_RETRIES);
                log_event!(warn, COMPONENT, "retrying decryption", attempt, reason = %last_failure);
                let backoff = self.config.retry_backoff();
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(EngineError::NotReady(format!(
            "decryption failed after {attempts} attempts: {last_failure}"
        )))
    }

    async fn teardown(&self) {
        let target = {
            let mut state = self.state.write();
            state.generation += 1;
            state.instance = None;
            self.status_tx.send_replace(EngineStatus::Uninitialized);
            state.target.take()
        };
        if let Some(target) = target {
            log_event!(info, COMPONENT, "engine torn down", engine = %target);
            self.announce(target, EngineStatus::Uninitialized).await;
        }
    }

    fn status(&self) -> EngineStatus {
        self.status_tx.borrow().clone()
    }

    fn target(&self) -> Option<EngineTarget> {
        self.state.read().target
    }
}
