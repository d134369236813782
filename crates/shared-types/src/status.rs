//! # Lifecycle and Snapshot Types
//!
//! State published by the subsystems: engine lifecycle, controller operation
//! state, deployment resolution and the aggregate snapshot carried by state
//! change notifications.

use crate::entities::{Address, CardAttributeSet, CardId, ChainId, DeploymentInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle of the encryption engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EngineStatus {
    /// No engine bound.
    #[default]
    Uninitialized,
    /// Connecting to the network-scoped engine.
    Initializing,
    /// Engine accepts encrypt/decrypt requests.
    Ready,
    /// Initialization failed.
    Error(String),
}

impl EngineStatus {
    /// True only in `Ready`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Short status label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Error(_) => "error",
        }
    }
}

/// A state-mutating controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutatingOperation {
    /// Minting a new card.
    Minting,
    /// Fusing two cards.
    Fusing,
    /// Decrypting a card's attributes.
    Decrypting,
}

impl MutatingOperation {
    /// Short operation label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Minting => "mint",
            Self::Fusing => "fuse",
            Self::Decrypting => "decrypt",
        }
    }
}

impl fmt::Display for MutatingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display phase derived from [`OperationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationPhase {
    /// Nothing running.
    Idle,
    /// Mint in flight.
    Minting,
    /// Fuse in flight.
    Fusing,
    /// Decrypt in flight.
    Decrypting,
    /// Only a refresh in flight.
    Refreshing,
}

/// Controller operation state.
///
/// At most one mutating operation is active; a refresh may overlap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OperationState {
    /// Active mutating operation, if any.
    pub active: Option<MutatingOperation>,
    /// Whether a refresh is running.
    pub refreshing: bool,
}

impl OperationState {
    /// Whether a new mutating operation may start.
    #[must_use]
    pub fn accepts_mutation(&self) -> bool {
        self.active.is_none()
    }

    /// True when nothing at all is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && !self.refreshing
    }

    /// Derived display phase. A mutating operation wins over a refresh.
    #[must_use]
    pub fn phase(&self) -> OperationPhase {
        match (self.active, self.refreshing) {
            (Some(MutatingOperation::Minting), _) => OperationPhase::Minting,
            (Some(MutatingOperation::Fusing), _) => OperationPhase::Fusing,
            (Some(MutatingOperation::Decrypting), _) => OperationPhase::Decrypting,
            (None, true) => OperationPhase::Refreshing,
            (None, false) => OperationPhase::Idle,
        }
    }
}

/// Result of resolving the card program on the active chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeploymentStatus {
    /// Not resolved yet (no session).
    #[default]
    Unknown,
    /// Program found.
    Deployed(DeploymentInfo),
    /// Program not deployed on this chain. Terminal for the session.
    NotDeployed {
        /// Chain that was queried.
        chain_id: ChainId,
    },
}

impl DeploymentStatus {
    /// Deployed program, if any.
    #[must_use]
    pub fn deployment(&self) -> Option<&DeploymentInfo> {
        match self {
            Self::Deployed(info) => Some(info),
            _ => None,
        }
    }
}

/// Identity of the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Monotonic session identifier.
    pub id: u64,
    /// Connected account.
    pub account: Address,
    /// Active chain.
    pub chain_id: ChainId,
}

/// Read-only projection of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistrySnapshot {
    /// Owner the projection belongs to.
    pub owner: Option<Address>,
    /// Owned cards and their visibility.
    pub cards: BTreeMap<CardId, CardAttributeSet>,
}

impl RegistrySnapshot {
    /// Owned card identifiers in ascending order.
    #[must_use]
    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.keys().copied().collect()
    }
}

/// Aggregate state carried by every controller state-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ControllerSnapshot {
    /// Active session, if a wallet is connected.
    pub session: Option<SessionInfo>,
    /// Deployment resolution for the session's chain.
    pub deployment: DeploymentStatus,
    /// Encryption engine lifecycle.
    pub engine: EngineStatus,
    /// Operation state.
    pub operation: OperationState,
    /// Registry projection.
    pub registry: RegistrySnapshot,
    /// Last surfaced error.
    pub last_error: Option<String>,
    /// Human-readable progress message.
    pub message: String,
}
