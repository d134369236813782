//! # Wallet Port
//!
//! The wallet is an external collaborator: it supplies the connected account,
//! the active network and a signing capability that may suspend on user
//! interaction or be declined outright.

use crate::entities::{Address, ChainId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a wallet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No account is connected.
    #[error("Wallet not connected")]
    NotConnected,

    /// The user rejected the signature request.
    #[error("Signature request declined: {0}")]
    Declined(String),

    /// Provider-side failure.
    #[error("Wallet provider error: {0}")]
    Provider(String),
}

/// Signing capability.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Sign an arbitrary message. The wallet hashes it with Keccak-256 and
    /// returns a 65-byte recoverable signature (r || s || v).
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}

/// Connected wallet.
#[async_trait]
pub trait WalletProvider: MessageSigner {
    /// Currently selected account.
    async fn account(&self) -> Result<Address, WalletError>;

    /// Currently selected network.
    async fn chain_id(&self) -> Result<ChainId, WalletError>;
}
