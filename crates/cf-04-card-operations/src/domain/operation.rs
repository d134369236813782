//! # Operation Claims
//!
//! At most one mutating operation runs at a time. A caller claims the slot
//! atomically and holds an [`OperationGuard`]; dropping the guard releases
//! the claim on every exit path. Claims carry a token so a claim abandoned
//! by a session teardown cannot release a newer one.
//!
//! Abandoning frees the slot at once. The abandoned operation may still be
//! waiting on a ledger submission, so for a short while a transaction from
//! the old session and one from the new session can both be pending. The
//! old one's result is dropped by its session check and never reaches the
//! registry; whatever it did on the ledger shows up on the next refresh of
//! the account that sent it.

use super::errors::{OperationError, OperationResult};
use parking_lot::Mutex;
use shared_types::{MutatingOperation, OperationState};

/// Operation state plus the token of the current claim.
#[derive(Debug, Default)]
pub struct OperationSlot {
    state: OperationState,
    claim: Option<u64>,
    next_claim: u64,
}

impl OperationSlot {
    /// Current state.
    pub fn state(&self) -> OperationState {
        self.state
    }

    /// Claim the slot for `operation`.
    pub fn try_claim(&mut self, operation: MutatingOperation) -> OperationResult<u64> {
        if let Some(active) = self.state.active {
            return Err(OperationError::OperationInProgress {
                requested: operation,
                active,
            });
        }
        self.next_claim += 1;
        self.claim = Some(self.next_claim);
        self.state.active = Some(operation);
        Ok(self.next_claim)
    }

    /// Release `claim` if it still holds the slot.
    pub fn release(&mut self, claim: u64) -> bool {
        if self.claim != Some(claim) {
            return false;
        }
        self.claim = None;
        self.state.active = None;
        true
    }

    /// Abandon any claim (session teardown). The slot is free on return,
    /// whether or not the abandoned operation has finished.
    pub fn abandon(&mut self) {
        self.claim = None;
        self.state.active = None;
    }

    /// Mark a refresh as running or finished.
    pub fn set_refreshing(&mut self, refreshing: bool) {
        self.state.refreshing = refreshing;
    }
}

/// RAII claim on the operation slot.
pub struct OperationGuard<'a> {
    slot: &'a Mutex<OperationSlot>,
    claim: u64,
    operation: MutatingOperation,
}

impl<'a> OperationGuard<'a> {
    /// Claim `slot` for `operation` or fail with `OperationInProgress`.
    pub fn claim(
        slot: &'a Mutex<OperationSlot>,
        operation: MutatingOperation,
    ) -> OperationResult<Self> {
        let claim = slot.lock().try_claim(operation)?;
        Ok(Self {
            slot,
            claim,
            operation,
        })
    }

    /// Operation this guard holds the slot for.
    pub fn operation(&self) -> MutatingOperation {
        self.operation
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.slot.lock().release(self.claim);
    }
}
