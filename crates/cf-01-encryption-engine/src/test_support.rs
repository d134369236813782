//! Shared fixtures for unit tests.

use async_trait::async_trait;
use shared_crypto::Secp256k1KeyPair;
use shared_types::{
    Address, AuthorizationRequest, ChainId, DecryptionAuthorization, MessageSigner, WalletError,
    WalletProvider,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const PROGRAM: Address = [0xC0; 20];

/// In-process wallet with a random key.
pub struct TestWallet {
    pub key: Secp256k1KeyPair,
    chain_id: AtomicU64,
}

impl TestWallet {
    pub fn on_chain(chain_id: ChainId) -> Arc<Self> {
        Arc::new(Self {
            key: Secp256k1KeyPair::generate(),
            chain_id: AtomicU64::new(chain_id),
        })
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    /// Authorization for `program` valid over `[start, start + duration)`.
    pub async fn authorize(
        &self,
        program: Address,
        start: u64,
        duration: u64,
    ) -> DecryptionAuthorization {
        let request = AuthorizationRequest {
            user: self.address(),
            program,
            start_timestamp: start,
            duration_secs: duration,
            nonce: [7u8; 16],
        };
        let signature = self.sign(&request.encode()).await.unwrap();
        DecryptionAuthorization { request, signature }
    }
}

#[async_trait]
impl MessageSigner for TestWallet {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.key
            .sign_message(message)
            .map(|s| s.to_vec())
            .map_err(|e| WalletError::Provider(e.to_string()))
    }
}

#[async_trait]
impl WalletProvider for TestWallet {
    async fn account(&self) -> Result<Address, WalletError> {
        Ok(self.address())
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}
