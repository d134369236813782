//! Process-lifetime authorization store.

use crate::domain::SignatureCacheResult;
use crate::ports::AuthorizationStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{AuthorizationKey, DecryptionAuthorization};
use std::collections::HashMap;

/// In-memory [`AuthorizationStore`]. Entries live as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationStore {
    entries: RwLock<HashMap<AuthorizationKey, DecryptionAuthorization>>,
}

impl InMemoryAuthorizationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored authorizations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuthorizationStore for InMemoryAuthorizationStore {
    async fn load(
        &self,
        key: &AuthorizationKey,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn save(&self, authorization: DecryptionAuthorization) -> SignatureCacheResult<()> {
        self.entries.write().insert(authorization.key(), authorization);
        Ok(())
    }

    async fn remove(
        &self,
        key: &AuthorizationKey,
    ) -> SignatureCacheResult<Option<DecryptionAuthorization>> {
        Ok(self.entries.write().remove(key))
    }

    async fn keys(&self) -> SignatureCacheResult<Vec<AuthorizationKey>> {
        Ok(self.entries.read().keys().copied().collect())
    }
}
