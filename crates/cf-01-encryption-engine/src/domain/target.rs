//! # Engine Target
//!
//! The (chain, program) pair an engine instance is bound to.

use super::errors::EngineError;
use shared_types::{format_address, Address, ChainId, ZERO_ADDRESS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The (chain, program) pair an engine instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineTarget {
    /// Ledger network.
    pub chain_id: ChainId,
    /// Card program address.
    pub program: Address,
}

impl EngineTarget {
    /// Build a target, rejecting an unknown chain or an unset program.
    pub fn new(chain_id: ChainId, program: Address) -> Result<Self, EngineError> {
        if chain_id == 0 {
            return Err(EngineError::Init("chain id is unknown".to_string()));
        }
        if program == ZERO_ADDRESS {
            return Err(EngineError::Init("program address is unset".to_string()));
        }
        Ok(Self { chain_id, program })
    }
}

impl fmt::Display for EngineTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", format_address(&self.program), self.chain_id)
    }
}
