//! # Domain Invariants
//!
//! Checks the binding enforces before touching the engine.

use super::errors::EngineError;
use shared_types::{DecryptionAuthorization, FieldWidth};

/// A plaintext must be representable in its field width.
pub fn check_encodable(value: u64, width: FieldWidth) -> Result<(), EngineError> {
    if width.fits(value) {
        Ok(())
    } else {
        Err(EngineError::Encoding { value, width })
    }
}

/// No decryption request may be issued under an elapsed authorization.
pub fn check_authorization_live(
    authorization: &DecryptionAuthorization,
    now: u64,
) -> Result<(), EngineError> {
    if authorization.is_valid_at(now) {
        Ok(())
    } else {
        Err(EngineError::AuthorizationExpired {
            expired_at: authorization.expires_at(),
        })
    }
}
