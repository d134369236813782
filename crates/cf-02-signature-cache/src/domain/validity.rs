//! # Validity Rules
//!
//! A cached authorization is only served while its window covers the current
//! time and it belongs to the requested key.

use shared_types::{AuthorizationKey, DecryptionAuthorization};

/// Why a stored authorization cannot be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unusable {
    /// The window has elapsed.
    Expired,
    /// The window has not started yet (clock moved backwards).
    NotYetValid,
    /// Stored under the wrong key.
    KeyMismatch,
}

impl Unusable {
    /// Eviction reason as published on the bus.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::NotYetValid => "not yet valid",
            Self::KeyMismatch => "key mismatch",
        }
    }
}

/// Check whether `authorization` may be served for `key` at `now`.
pub fn check_usable(
    authorization: &DecryptionAuthorization,
    key: &AuthorizationKey,
    now: u64,
) -> Result<(), Unusable> {
    if authorization.key() != *key {
        return Err(Unusable::KeyMismatch);
    }
    if now < authorization.request.start_timestamp {
        return Err(Unusable::NotYetValid);
    }
    if now >= authorization.expires_at() {
        return Err(Unusable::Expired);
    }
    Ok(())
}
