//! # Domain Errors
//!
//! Error types for the Encryption Engine Binding.

use shared_types::FieldWidth;
use thiserror::Error;

/// Encryption engine error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be initialized (unknown target, connection
    /// failure, timeout, or superseded by a newer initialization).
    #[error("Engine initialization failed: {0}")]
    Init(String),

    /// Plaintext does not fit the requested field width.
    #[error("Value {value} exceeds the range of {width}")]
    Encoding {
        /// Rejected value
        value: u64,
        /// Requested width
        width: FieldWidth,
    },

    /// The engine is not `Ready`, or failed on the engine side.
    #[error("Engine not ready: {0}")]
    NotReady(String),

    /// The decryption authorization's validity window has elapsed.
    #[error("Decryption authorization expired at {expired_at}")]
    AuthorizationExpired {
        /// Exclusive expiry (unix seconds)
        expired_at: u64,
    },

    /// The card program denied access to the ciphertext.
    #[error("Decryption rejected: {0}")]
    DecryptionRejected(String),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
