//! # Outbound Ports
//!
//! The network-scoped FHE engine the binding drives. A full runtime talks to
//! the network's coprocessor and relayer; the local runtime serves
//! development chains. Both fulfil the same contract.

use crate::domain::EngineTarget;
use async_trait::async_trait;
use shared_types::{Address, CiphertextHandle, DecryptionAuthorization, FieldWidth, WalletProvider};
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by an engine runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FheFailure {
    /// Retryable failure (network hiccup, relayer busy).
    #[error("transient engine failure: {0}")]
    Transient(String),

    /// The program's access list or the authorization does not permit it.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The engine does not know this ciphertext.
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    /// Non-retryable engine failure.
    #[error("engine failure: {0}")]
    Fatal(String),
}

/// Engine runtime - outbound port. Creates instances bound to a target.
#[async_trait]
pub trait FheRuntime: Send + Sync {
    /// Runtime label for logs and metrics.
    fn name(&self) -> &'static str;

    /// Connect an engine instance to `target` through the wallet's provider.
    async fn connect(
        &self,
        target: &EngineTarget,
        wallet: Arc<dyn WalletProvider>,
    ) -> Result<Arc<dyn FheInstance>, FheFailure>;
}

/// A connected engine instance - outbound port.
#[async_trait]
pub trait FheInstance: Send + Sync {
    /// Encrypt `value` as an input of `user` for the bound program.
    async fn encrypt(
        &self,
        value: u64,
        width: FieldWidth,
        user: Address,
    ) -> Result<CiphertextHandle, FheFailure>;

    /// Reencrypt-and-decrypt `handle` for the authorization's user.
    async fn user_decrypt(
        &self,
        handle: CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64, FheFailure>;
}
