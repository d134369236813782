//! # Domain Errors
//!
//! The single error type surfaced by the controller. Component errors are
//! converted with `From` so messages reach the caller verbatim.

use cf_01_encryption_engine::EngineError;
use cf_02_signature_cache::SignatureCacheError;
use cf_03_card_registry::{LedgerError, RegistryError};
use shared_types::{CardAttribute, CardId, ChainId, FieldWidth, MutatingOperation, WalletError};
use thiserror::Error;

/// Controller error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The engine could not be initialized.
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// A plaintext does not fit its field width.
    #[error("Value {value} exceeds the range of {width}")]
    Encoding {
        /// Rejected value
        value: u64,
        /// Requested width
        width: FieldWidth,
    },

    /// The engine is not ready or failed engine-side.
    #[error("Engine not ready: {0}")]
    EngineNotReady(String),

    /// The decryption authorization expired mid-operation.
    #[error("Decryption authorization expired at {expired_at}")]
    AuthorizationExpired {
        /// Exclusive expiry (unix seconds)
        expired_at: u64,
    },

    /// The wallet declined or did not answer the signature prompt.
    #[error("Signature request declined: {0}")]
    SigningDeclined(String),

    /// The card program denied access to a ciphertext.
    #[error("Decryption rejected: {0}")]
    DecryptionRejected(String),

    /// An attribute lies outside the program's domain.
    #[error("{attribute} = {value} is outside [{min}, {max}]")]
    InvalidAttributeRange {
        /// Offending attribute
        attribute: CardAttribute,
        /// Offending value
        value: u64,
        /// Domain lower bound
        min: u64,
        /// Domain upper bound
        max: u64,
    },

    /// A card cannot be fused with itself.
    #[error("Cannot fuse card {0} with itself")]
    InvalidFusionPair(CardId),

    /// Submission or ledger read failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Ledger state after an operation did not match expectations.
    #[error("Consistency anomaly after {operation}: {detail}")]
    ConsistencyAnomaly {
        /// Operation being reconciled
        operation: MutatingOperation,
        /// What was observed
        detail: String,
    },

    /// Another mutating operation holds the controller.
    #[error("Cannot start {requested}: {active} in progress")]
    OperationInProgress {
        /// Operation that was rejected
        requested: MutatingOperation,
        /// Operation holding the claim
        active: MutatingOperation,
    },

    /// No wallet account is connected.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// The card program has no deployment on this chain.
    #[error("Card program is not deployed on chain {chain_id}")]
    NotDeployed {
        /// Active chain
        chain_id: ChainId,
    },

    /// The card is not in the active account's owned set.
    #[error("Card {0} is not owned by the active account")]
    CardNotOwned(CardId),

    /// The card's attributes are already revealed.
    #[error("Card {0} is already revealed")]
    CardAlreadyRevealed(CardId),

    /// Some attributes failed to decrypt; the card stays sealed.
    #[error("Decryption incomplete, failed fields: {}", join_attributes(.failed))]
    DecryptionIncomplete {
        /// Attributes that failed
        failed: Vec<CardAttribute>,
    },

    /// The session changed while the operation was in flight; its result
    /// was discarded.
    #[error("Session changed while the operation was in flight")]
    StaleSession,
}

fn join_attributes(attributes: &[CardAttribute]) -> String {
    attributes
        .iter()
        .map(CardAttribute::name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<EngineError> for OperationError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Init(reason) => Self::EngineInit(reason),
            EngineError::Encoding { value, width } => Self::Encoding { value, width },
            EngineError::NotReady(reason) => Self::EngineNotReady(reason),
            EngineError::AuthorizationExpired { expired_at } => {
                Self::AuthorizationExpired { expired_at }
            }
            EngineError::DecryptionRejected(reason) => Self::DecryptionRejected(reason),
        }
    }
}

impl From<SignatureCacheError> for OperationError {
    fn from(err: SignatureCacheError) -> Self {
        match err {
            SignatureCacheError::SigningDeclined(reason) => Self::SigningDeclined(reason),
            SignatureCacheError::Store(reason) => {
                Self::SigningDeclined(format!("authorization store failed: {reason}"))
            }
        }
    }
}

impl From<LedgerError> for OperationError {
    fn from(err: LedgerError) -> Self {
        Self::TransactionFailed(err.to_string())
    }
}

impl From<RegistryError> for OperationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotOwned(card) => Self::CardNotOwned(card),
            RegistryError::HandlesChanged(card) => Self::ConsistencyAnomaly {
                operation: MutatingOperation::Decrypting,
                detail: format!("card {card} changed on the ledger while it was being decrypted"),
            },
            RegistryError::Ledger(ledger) => ledger.into(),
        }
    }
}

impl From<WalletError> for OperationError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotConnected => Self::WalletNotConnected,
            WalletError::Declined(reason) => Self::SigningDeclined(reason),
            WalletError::Provider(reason) => Self::TransactionFailed(reason),
        }
    }
}

/// Result alias for controller operations.
pub type OperationResult<T> = Result<T, OperationError>;
