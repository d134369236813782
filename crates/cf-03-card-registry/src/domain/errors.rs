//! # Domain Errors

use shared_types::CardId;
use thiserror::Error;

/// Failures reading the card program's state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The node could not be reached or answered with garbage.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The program does not know this card (never minted or burned).
    #[error("Unknown card {0}")]
    UnknownCard(CardId),

    /// A submitted transaction was rejected or reverted.
    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

/// Registry error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The card is not in the current owned set.
    #[error("Card {0} is not owned by the active account")]
    NotOwned(CardId),

    /// The card's handles changed after they were read for decryption.
    #[error("Card {0} changed while it was being decrypted")]
    HandlesChanged(CardId),

    /// Reading the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
