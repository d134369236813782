//! # Session Context
//!
//! A session is one `(account, chain, deployment)` triple. Every open or
//! close advances a generation counter; work started under an older
//! generation is stale and its result is discarded.

use super::errors::{OperationError, OperationResult};
use shared_types::{Address, ChainId, DeploymentInfo, SessionInfo};

/// The active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Generation the session was opened at.
    pub id: u64,
    /// Connected account.
    pub account: Address,
    /// Active chain.
    pub chain_id: ChainId,
    /// Card program deployment on that chain.
    pub deployment: DeploymentInfo,
}

impl SessionContext {
    /// Card program address.
    pub fn program(&self) -> Address {
        self.deployment.address
    }

    /// Public projection for snapshots.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            account: self.account,
            chain_id: self.chain_id,
        }
    }
}

/// Holder of the current session and its generation.
#[derive(Debug, Default)]
pub struct SessionSlot {
    generation: u64,
    current: Option<SessionContext>,
}

impl SessionSlot {
    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Active session, if any.
    pub fn current(&self) -> Option<&SessionContext> {
        self.current.as_ref()
    }

    /// Drop the active session. Returns it together with the new generation.
    pub fn close(&mut self) -> (Option<SessionContext>, u64) {
        self.generation += 1;
        (self.current.take(), self.generation)
    }

    /// Open a session, provided nothing happened since `expected`.
    pub fn open(
        &mut self,
        expected: u64,
        account: Address,
        chain_id: ChainId,
        deployment: DeploymentInfo,
    ) -> OperationResult<SessionContext> {
        if self.generation != expected {
            return Err(OperationError::StaleSession);
        }
        self.generation += 1;
        let session = SessionContext {
            id: self.generation,
            account,
            chain_id,
            deployment,
        };
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Whether `session` is still the active one.
    pub fn is_current(&self, session: &SessionContext) -> bool {
        self.current.as_ref().is_some_and(|c| c.id == session.id)
    }

    /// `StaleSession` unless `session` is still the active one.
    pub fn ensure_current(&self, session: &SessionContext) -> OperationResult<()> {
        if self.is_current(session) {
            Ok(())
        } else {
            Err(OperationError::StaleSession)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment() -> DeploymentInfo {
        DeploymentInfo {
            address: [0xC0; 20],
            chain_id: 31337,
            chain_name: "hardhat".to_string(),
        }
    }

    #[test]
    fn test_open_and_close() {
        let mut slot = SessionSlot::default();
        let (_, generation) = slot.close();
        let session = slot
            .open(generation, [1u8; 20], 31337, deployment())
            .unwrap();

        assert!(slot.is_current(&session));
        assert_eq!(session.program(), [0xC0; 20]);

        let (closed, _) = slot.close();
        assert_eq!(closed, Some(session.clone()));
        assert_eq!(slot.ensure_current(&session), Err(OperationError::StaleSession));
    }

    #[test]
    fn test_open_rejects_outdated_generation() {
        let mut slot = SessionSlot::default();
        let (_, first) = slot.close();
        let (_, _second) = slot.close();

        let result = slot.open(first, [1u8; 20], 31337, deployment());
        assert_eq!(result, Err(OperationError::StaleSession));
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_reopened_session_is_distinct() {
        let mut slot = SessionSlot::default();
        let (_, g) = slot.close();
        let old = slot.open(g, [1u8; 20], 31337, deployment()).unwrap();
        let (_, g) = slot.close();
        let new = slot.open(g, [1u8; 20], 31337, deployment()).unwrap();

        assert_ne!(old.id, new.id);
        assert!(!slot.is_current(&old));
        assert!(slot.is_current(&new));
    }
}
