//! # Fusion Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, CardId, CardStats, ChainId, ControllerSnapshot, EngineStatus, MutatingOperation,
};

/// Component identifiers used as event sources.
pub mod component {
    /// Encryption engine binding.
    pub const ENGINE: u8 = 1;
    /// Decryption signature cache.
    pub const SIGNATURE_CACHE: u8 = 2;
    /// Card registry view.
    pub const REGISTRY: u8 = 3;
    /// Card operation controller.
    pub const CONTROLLER: u8 = 4;
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FusionEvent {
    // =========================================================================
    // COMPONENT 1: ENCRYPTION ENGINE
    // =========================================================================
    /// The engine lifecycle moved to a new status.
    EngineStatusChanged {
        /// Chain the engine is (being) bound to.
        chain_id: ChainId,
        /// Program the engine is (being) bound to.
        program: Address,
        /// New status.
        status: EngineStatus,
    },

    // =========================================================================
    // COMPONENT 2: SIGNATURE CACHE
    // =========================================================================
    /// A new decryption authorization was signed and cached.
    AuthorizationCreated {
        /// Signing account.
        user: Address,
        /// Program the authorization applies to.
        program: Address,
        /// Exclusive expiry (unix seconds).
        expires_at: u64,
    },

    /// A cached authorization was dropped.
    AuthorizationEvicted {
        /// Signing account.
        user: Address,
        /// Program the authorization applied to.
        program: Address,
        /// Why it was dropped.
        reason: String,
    },

    // =========================================================================
    // COMPONENT 3: REGISTRY
    // =========================================================================
    /// The owned card set was replaced by a fresh ledger read.
    RegistryRefreshed {
        /// Owner the set belongs to.
        owner: Address,
        /// Owned cards after the refresh.
        cards: Vec<CardId>,
    },

    // =========================================================================
    // COMPONENT 4: CONTROLLER
    // =========================================================================
    /// A mint landed and the new card was observed.
    CardMinted {
        /// The new card.
        card_id: CardId,
    },

    /// A fusion landed; parents burned, child observed.
    CardsFused {
        /// Burned parents.
        parents: (CardId, CardId),
        /// New card.
        child: CardId,
    },

    /// All four attributes of a card were decrypted.
    CardRevealed {
        /// The revealed card.
        card_id: CardId,
        /// Decrypted values.
        stats: CardStats,
    },

    /// An operation failed; the operation state was restored.
    OperationFailed {
        /// `mint`, `fuse`, `decrypt` or `refresh`.
        operation: String,
        /// Error message as surfaced to the caller.
        error: String,
    },

    /// Post-operation ledger state did not match expectations.
    ConsistencyAnomaly {
        /// Operation whose reconciliation failed.
        operation: MutatingOperation,
        /// What was observed.
        detail: String,
    },

    /// Aggregate controller state after any change.
    StateChanged(Box<ControllerSnapshot>),
}

impl FusionEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::EngineStatusChanged { .. } => EventTopic::Engine,
            Self::AuthorizationCreated { .. } | Self::AuthorizationEvicted { .. } => {
                EventTopic::Authorization
            }
            Self::RegistryRefreshed { .. } => EventTopic::Registry,
            Self::CardMinted { .. } | Self::CardsFused { .. } | Self::CardRevealed { .. } => {
                EventTopic::Cards
            }
            Self::OperationFailed { .. } | Self::ConsistencyAnomaly { .. } => EventTopic::Errors,
            Self::StateChanged(_) => EventTopic::State,
        }
    }

    /// Get the originating component ID.
    #[must_use]
    pub fn source_component(&self) -> u8 {
        match self {
            Self::EngineStatusChanged { .. } => component::ENGINE,
            Self::AuthorizationCreated { .. } | Self::AuthorizationEvicted { .. } => {
                component::SIGNATURE_CACHE
            }
            Self::RegistryRefreshed { .. } => component::REGISTRY,
            Self::CardMinted { .. }
            | Self::CardsFused { .. }
            | Self::CardRevealed { .. }
            | Self::OperationFailed { .. }
            | Self::ConsistencyAnomaly { .. }
            | Self::StateChanged(_) => component::CONTROLLER,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Engine lifecycle.
    Engine,
    /// Authorization cache changes.
    Authorization,
    /// Registry refreshes.
    Registry,
    /// Card outcomes (mint, fuse, reveal).
    Cards,
    /// Failures and anomalies.
    Errors,
    /// Aggregate state snapshots.
    State,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source components to include. Empty means all sources.
    pub source_components: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_components: Vec::new(),
        }
    }

    /// Create a filter for events from specific components.
    #[must_use]
    pub fn from_components(components: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_components: components,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &FusionEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_components.is_empty()
            || self.source_components.contains(&event.source_component());

        topic_match && source_match
    }
}
