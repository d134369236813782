//! # Inbound Ports
//!
//! API trait defining what the Decryption Signature Cache can do.

use crate::domain::SignatureCacheResult;
use async_trait::async_trait;
use shared_types::{Address, DecryptionAuthorization, MessageSigner};

/// Signature cache API - inbound port.
#[async_trait]
pub trait SignatureCacheApi: Send + Sync {
    /// Return a valid authorization for `(user, program)`, prompting `signer`
    /// only when none is cached.
    ///
    /// Concurrent calls for the same key share a single prompt. Expired
    /// entries are evicted and never returned.
    async fn get_or_create<S>(
        &self,
        user: Address,
        program: Address,
        signer: &S,
    ) -> SignatureCacheResult<DecryptionAuthorization>
    where
        S: MessageSigner + ?Sized;

    /// Drop the authorization for `(user, program)`.
    async fn invalidate(&self, user: Address, program: Address) -> SignatureCacheResult<bool>;

    /// Drop every authorization of `user`. Returns how many were dropped.
    async fn invalidate_user(&self, user: Address) -> SignatureCacheResult<usize>;

    /// Drop every authorization whose window has elapsed.
    async fn purge_expired(&self) -> SignatureCacheResult<usize>;
}
