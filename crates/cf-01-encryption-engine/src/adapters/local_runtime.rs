//! # Local Runtime Adapter
//!
//! Non-cryptographic engine for development chains (hardhat). Encryption
//! stores the plaintext in the shared [`DevCiphertextStore`]; decryption
//! enforces the same rules as the network engine: the authorization must be
//! signed by its user for this program, and the user must be on the
//! ciphertext's access list.
//!
//! [`LocalRuntimeControls`] injects faults for tests and simulations.

use super::dev_store::DevCiphertextStore;
use crate::domain::EngineTarget;
use crate::ports::{FheFailure, FheInstance, FheRuntime};
use async_trait::async_trait;
use shared_crypto::recover_address;
use shared_types::{
    format_address, Address, CiphertextHandle, DecryptionAuthorization, FieldWidth,
    WalletProvider,
};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fault-injection knobs shared by a runtime and its instances.
#[derive(Debug, Default)]
pub struct LocalRuntimeControls {
    connect_delay_ms: AtomicU64,
    fail_connect: AtomicBool,
    decrypt_delay_ms: AtomicU64,
    transient_failures: AtomicU32,
    connects: AtomicU64,
    decrypt_calls: AtomicU64,
}

impl LocalRuntimeControls {
    /// Delay every connection attempt.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.connect_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make connection attempts fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Delay every decryption call.
    pub fn set_decrypt_delay(&self, delay: Duration) {
        self.decrypt_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Fail the next `count` decryption calls with a transient error.
    pub fn inject_transient_failures(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Connection attempts so far.
    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Decryption calls so far (including failed ones).
    pub fn decrypt_calls(&self) -> u64 {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Local engine runtime.
pub struct LocalFheRuntime {
    store: Arc<DevCiphertextStore>,
    controls: Arc<LocalRuntimeControls>,
}

impl LocalFheRuntime {
    /// Create a runtime over a shared store.
    pub fn new(store: Arc<DevCiphertextStore>) -> Self {
        Self {
            store,
            controls: Arc::new(LocalRuntimeControls::default()),
        }
    }

    /// Fault-injection knobs.
    pub fn controls(&self) -> Arc<LocalRuntimeControls> {
        Arc::clone(&self.controls)
    }

    /// Backing store.
    pub fn store(&self) -> Arc<DevCiphertextStore> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl FheRuntime for LocalFheRuntime {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn connect(
        &self,
        target: &EngineTarget,
        wallet: Arc<dyn WalletProvider>,
    ) -> Result<Arc<dyn FheInstance>, FheFailure> {
        self.controls.connects.fetch_add(1, Ordering::SeqCst);

        let delay = self.controls.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.controls.fail_connect.load(Ordering::SeqCst) {
            return Err(FheFailure::Fatal("connection refused".to_string()));
        }

        let provider_chain = wallet
            .chain_id()
            .await
            .map_err(|e| FheFailure::Fatal(e.to_string()))?;
        if provider_chain != target.chain_id {
            return Err(FheFailure::Fatal(format!(
                "provider is on chain {provider_chain}, expected {}",
                target.chain_id
            )));
        }

        debug!(engine = %target, "[cf-01] local engine instance created");
        Ok(Arc::new(LocalFheInstance {
            target: *target,
            store: Arc::clone(&self.store),
            controls: Arc::clone(&self.controls),
        }))
    }
}

/// Engine instance produced by [`LocalFheRuntime`].
pub struct LocalFheInstance {
    target: EngineTarget,
    store: Arc<DevCiphertextStore>,
    controls: Arc<LocalRuntimeControls>,
}

impl LocalFheInstance {
    fn verify_authorization(
        &self,
        authorization: &DecryptionAuthorization,
    ) -> Result<Address, FheFailure> {
        let request = &authorization.request;
        if request.program != self.target.program {
            return Err(FheFailure::AccessDenied(
                "authorization was issued for another program".to_string(),
            ));
        }

        let signer = recover_address(&request.encode(), &authorization.signature)
            .map_err(|e| FheFailure::AccessDenied(format!("invalid authorization: {e}")))?;
        if signer != request.user {
            return Err(FheFailure::AccessDenied(format!(
                "authorization for {} was signed by {}",
                format_address(&request.user),
                format_address(&signer)
            )));
        }
        Ok(signer)
    }
}

#[async_trait]
impl FheInstance for LocalFheInstance {
    async fn encrypt(
        &self,
        value: u64,
        width: FieldWidth,
        user: Address,
    ) -> Result<CiphertextHandle, FheFailure> {
        if !width.fits(value) {
            return Err(FheFailure::Fatal(format!("{value} does not fit {width}")));
        }
        Ok(self
            .store
            .insert_input(self.target.program, user, value, width))
    }

    async fn user_decrypt(
        &self,
        handle: CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64, FheFailure> {
        self.controls.decrypt_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.controls.decrypt_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.controls.take_transient_failure() {
            return Err(FheFailure::Transient("relayer unavailable".to_string()));
        }

        let user = self.verify_authorization(authorization)?;
        if !self.store.is_allowed(&handle, &user) {
            return Err(FheFailure::AccessDenied(format!(
                "{} is not allowed to decrypt {handle}",
                format_address(&user)
            )));
        }

        let (value, _) = self.store.plaintext(&handle)?;
        Ok(value)
    }
}
