//! # Inbound Ports
//!
//! API trait defining what the Card Registry View can do.

use crate::application::RegistryLoad;
use crate::domain::RegistryResult;
use async_trait::async_trait;
use shared_types::{Address, CardAttributeSet, CardCiphertexts, CardId, CardStats, RegistrySnapshot};
use std::collections::BTreeSet;

/// Card registry API - inbound port.
#[async_trait]
pub trait CardRegistryApi: Send + Sync {
    /// Read `owner`'s cards and their ciphertext handles. No state change.
    async fn load(&self, program: Address, owner: Address) -> RegistryResult<RegistryLoad>;

    /// Replace the owned set with `load`. Returns the new owned ids.
    async fn apply(&self, load: RegistryLoad) -> BTreeSet<CardId>;

    /// `load` followed by `apply`.
    async fn refresh(&self, program: Address, owner: Address) -> RegistryResult<BTreeSet<CardId>>;

    /// Attributes of an owned card.
    fn get_attributes(&self, card: CardId) -> Option<CardAttributeSet>;

    /// Mark an owned card as revealed. `decrypted` are the handles the
    /// values came from; the write is refused if the card no longer holds
    /// them.
    fn record_revealed(
        &self,
        card: CardId,
        decrypted: &CardCiphertexts,
        stats: CardStats,
    ) -> RegistryResult<()>;

    /// Forget everything (session teardown).
    fn clear(&self);

    /// Current view for notifications.
    fn snapshot(&self) -> RegistrySnapshot;
}
