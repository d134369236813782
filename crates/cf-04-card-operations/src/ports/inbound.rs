//! # Inbound Ports
//!
//! API trait defining what the Card Operation Controller can do.

use crate::domain::OperationResult;
use async_trait::async_trait;
use shared_bus::{EventFilter, Subscription};
use shared_types::{CardId, CardStats, ControllerSnapshot, SessionInfo};
use std::collections::BTreeSet;

/// Card operation controller API - inbound port.
#[async_trait]
pub trait CardOperationsApi: Send + Sync {
    /// Open a session for the wallet's current account and chain: resolve
    /// the deployment, initialize the engine, load the owned cards.
    async fn connect(&self) -> OperationResult<SessionInfo>;

    /// Re-read the wallet; rebuild the session if account or chain changed.
    /// Returns whether the session was rebuilt.
    async fn sync_wallet(&self) -> OperationResult<bool>;

    /// Tear the session down. In-flight results are discarded.
    async fn disconnect(&self);

    /// Mint a card with the given plaintext attributes.
    async fn mint(&self, stats: CardStats) -> OperationResult<CardId>;

    /// Fuse two owned cards into a new one.
    async fn fuse(&self, a: CardId, b: CardId) -> OperationResult<CardId>;

    /// Decrypt all four attributes of an owned, sealed card.
    async fn decrypt_attributes(&self, card: CardId) -> OperationResult<CardStats>;

    /// Re-read the owned set. Joins a refresh already in flight.
    async fn refresh(&self) -> OperationResult<BTreeSet<CardId>>;

    /// Whether `mint` may start now.
    fn can_mint(&self) -> bool;

    /// Whether `fuse` may start now.
    fn can_fuse(&self) -> bool;

    /// Whether `decrypt_attributes(card)` may start now.
    fn can_decrypt(&self, card: CardId) -> bool;

    /// Whether a refresh may start now.
    fn can_refresh(&self) -> bool;

    /// Aggregate state.
    fn snapshot(&self) -> ControllerSnapshot;

    /// Subscribe to state-change notifications.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}
