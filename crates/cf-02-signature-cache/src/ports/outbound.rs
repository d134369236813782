//! # Outbound Ports
//!
//! Persistence for signed authorizations. The format is up to the adapter;
//! the cache only needs keyed load, save and removal.

use crate::domain::SignatureCacheResult;
use async_trait::async_trait;
use shared_types::{AuthorizationKey, DecryptionAuthorization};

/// Authorization storage - outbound port.
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    /// Load the authorization stored under `key`.
    async fn load(
        &self,
        key: &AuthorizationKey,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>>;

    /// Store `authorization` under its own key, replacing any previous one.
    async fn save(&self, authorization: DecryptionAuthorization) -> SignatureCacheResult<()>;

    /// Remove the authorization stored under `key`.
    async fn remove(
        &self,
        key: &AuthorizationKey,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>>;

    /// All stored keys.
    async fn keys(&self) -> SignatureCacheResult<Vec<AuthorizationKey>>;
}
