//! # Inbound Ports
//!
//! API trait defining what the Encryption Engine Binding can do.

use crate::domain::{EngineResult, EngineTarget};
use async_trait::async_trait;
use shared_types::{
    Address, ChainId, CiphertextHandle, DecryptionAuthorization, EngineStatus, FieldWidth,
    WalletProvider,
};
use std::sync::Arc;

/// Encryption Engine API - inbound port.
#[async_trait]
pub trait EncryptionEngineApi: Send + Sync {
    /// Bind the engine to `(chain_id, program)`.
    ///
    /// Idempotent while the target is unchanged: a `Ready` engine is reused
    /// and an in-flight initialization is joined. A different target
    /// supersedes any in-flight initialization; the stale one resolves to
    /// `EngineError::Init` and is never adopted.
    async fn initialize(
        &self,
        chain_id: ChainId,
        program: Address,
        wallet: Arc<dyn WalletProvider>,
    ) -> EngineResult<()>;

    /// Encrypt `value` as an input of `user` for the bound program.
    async fn encrypt(
        &self,
        value: u64,
        width: FieldWidth,
        user: Address,
    ) -> EngineResult<CiphertextHandle>;

    /// Decrypt `handle` under `authorization`.
    ///
    /// Transient engine failures are retried up to the configured attempt
    /// count; `AuthorizationExpired` and `DecryptionRejected` are not.
    async fn request_decryption(
        &self,
        handle: CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> EngineResult<u64>;

    /// Drop the bound engine and return to `Uninitialized`.
    async fn teardown(&self);

    /// Current lifecycle status.
    fn status(&self) -> EngineStatus;

    /// Target of the current (or in-flight) binding.
    fn target(&self) -> Option<EngineTarget>;
}
