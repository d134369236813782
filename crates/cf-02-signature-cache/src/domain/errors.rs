//! # Domain Errors

use thiserror::Error;

/// Signature cache error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureCacheError {
    /// The wallet rejected the prompt, failed, or did not answer in time.
    #[error("Signature request declined: {0}")]
    SigningDeclined(String),

    /// The authorization store failed.
    #[error("Authorization store error: {0}")]
    Store(String),
}

/// Result alias for signature cache operations.
pub type SignatureCacheResult<T> = Result<T, SignatureCacheError>;
