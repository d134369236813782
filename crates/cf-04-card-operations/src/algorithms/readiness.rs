//! # Readiness Predicates
//!
//! Side-effect-free answers to "may this operation start now?". Inputs are
//! rebuilt from live component state on every query; nothing here is
//! cached.

use shared_types::{CardId, OperationState};
use std::collections::BTreeSet;

/// Component state the predicates read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessInputs {
    /// Engine status is `Ready`.
    pub engine_ready: bool,
    /// A wallet session is active.
    pub wallet_connected: bool,
    /// Current operation state.
    pub operation: OperationState,
    /// Owned cards.
    pub owned: BTreeSet<CardId>,
    /// Owned cards that are still sealed.
    pub sealed: BTreeSet<CardId>,
}

/// Engine ready, wallet connected, no mutating operation running.
pub fn can_mint(inputs: &ReadinessInputs) -> bool {
    inputs.engine_ready && inputs.wallet_connected && inputs.operation.accepts_mutation()
}

/// `can_mint` plus at least two owned cards.
pub fn can_fuse(inputs: &ReadinessInputs) -> bool {
    can_mint(inputs) && inputs.owned.len() >= 2
}

/// Card owned and sealed, no mutating operation running.
pub fn can_decrypt(inputs: &ReadinessInputs, card: CardId) -> bool {
    inputs.owned.contains(&card)
        && inputs.sealed.contains(&card)
        && inputs.operation.accepts_mutation()
}

/// Wallet connected and no refresh already running.
pub fn can_refresh(inputs: &ReadinessInputs) -> bool {
    inputs.wallet_connected && !inputs.operation.refreshing
}
