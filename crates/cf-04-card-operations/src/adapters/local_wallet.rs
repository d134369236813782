//! # Local Wallet
//!
//! In-process wallet holding a secp256k1 key. Used on development chains,
//! by the demo CLI and by tests that need to switch accounts or networks,
//! decline prompts or stall them.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::Secp256k1KeyPair;
use shared_types::{Address, ChainId, MessageSigner, WalletError, WalletProvider};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Development wallet.
pub struct LocalWallet {
    key: RwLock<Arc<Secp256k1KeyPair>>,
    chain_id: AtomicU64,
    connected: AtomicBool,
    declining: AtomicBool,
    sign_delay_ms: AtomicU64,
    prompts: AtomicU64,
}

impl LocalWallet {
    /// Wallet with a fresh random key, connected to `chain_id`.
    pub fn generate(chain_id: ChainId) -> Self {
        Self::with_key(Secp256k1KeyPair::generate(), chain_id)
    }

    /// Wallet for an existing key.
    pub fn with_key(key: Secp256k1KeyPair, chain_id: ChainId) -> Self {
        Self {
            key: RwLock::new(Arc::new(key)),
            chain_id: AtomicU64::new(chain_id),
            connected: AtomicBool::new(true),
            declining: AtomicBool::new(false),
            sign_delay_ms: AtomicU64::new(0),
            prompts: AtomicU64::new(0),
        }
    }

    /// Address of the selected account.
    pub fn address(&self) -> Address {
        self.key.read().address()
    }

    /// Select another account. Returns its address.
    pub fn switch_account(&self, key: Secp256k1KeyPair) -> Address {
        let address = key.address();
        *self.key.write() = Arc::new(key);
        address
    }

    /// Select another network.
    pub fn switch_chain(&self, chain_id: ChainId) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Connect or disconnect the account.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Decline every signature prompt.
    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }

    /// Stall every prompt for `ms` before answering.
    pub fn set_sign_delay(&self, ms: u64) {
        self.sign_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Signature prompts shown so far.
    pub fn prompt_count(&self) -> u64 {
        self.prompts.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), WalletError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WalletError::NotConnected)
        }
    }
}

#[async_trait]
impl MessageSigner for LocalWallet {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.ensure_connected()?;
        self.prompts.fetch_add(1, Ordering::SeqCst);

        let delay = self.sign_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.declining.load(Ordering::SeqCst) {
            return Err(WalletError::Declined("User rejected the request".to_string()));
        }

        let key = Arc::clone(&*self.key.read());
        key.sign_message(message)
            .map(|signature| signature.to_vec())
            .map_err(|e| WalletError::Provider(e.to_string()))
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn account(&self) -> Result<Address, WalletError> {
        self.ensure_connected()?;
        Ok(self.address())
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        self.ensure_connected()?;
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}
