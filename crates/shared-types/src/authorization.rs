//! # Decryption Authorization
//!
//! Time-scoped signature binding a user to a card program, permitting the
//! user to request decryption of ciphertexts that program granted them.

use crate::entities::Address;
use serde::{Deserialize, Serialize};

/// Domain tag prefixed to every authorization message.
pub const AUTHORIZATION_DOMAIN: &[u8] = b"CardFusion.DecryptionAuthorization.v1";

/// Cache key: authorizations are scoped to (account, program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationKey {
    /// Account the authorization was signed by.
    pub user: Address,
    /// Program the authorization applies to.
    pub program: Address,
}

impl AuthorizationKey {
    /// Create a new key.
    #[must_use]
    pub fn new(user: Address, program: Address) -> Self {
        Self { user, program }
    }
}

/// The unsigned part of an authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Requesting account.
    pub user: Address,
    /// Card program the decryptions target.
    pub program: Address,
    /// Start of the validity window (unix seconds).
    pub start_timestamp: u64,
    /// Length of the validity window in seconds.
    pub duration_secs: u64,
    /// Random nonce making every request unique.
    pub nonce: [u8; 16],
}

impl AuthorizationRequest {
    /// Exclusive end of the validity window.
    #[must_use]
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp.saturating_add(self.duration_secs)
    }

    /// Canonical byte encoding handed to the signer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(AUTHORIZATION_DOMAIN.len() + 20 + 20 + 8 + 8 + 16);
        out.extend_from_slice(AUTHORIZATION_DOMAIN);
        out.extend_from_slice(&self.user);
        out.extend_from_slice(&self.program);
        out.extend_from_slice(&self.start_timestamp.to_be_bytes());
        out.extend_from_slice(&self.duration_secs.to_be_bytes());
        out.extend_from_slice(&self.nonce);
        out
    }
}

/// A signed, time-scoped decryption authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionAuthorization {
    /// What was signed.
    pub request: AuthorizationRequest,
    /// Recoverable secp256k1 signature (r || s || v) over the request.
    pub signature: Vec<u8>,
}

impl DecryptionAuthorization {
    /// Cache key for this authorization.
    #[must_use]
    pub fn key(&self) -> AuthorizationKey {
        AuthorizationKey::new(self.request.user, self.request.program)
    }

    /// Exclusive end of the validity window.
    #[must_use]
    pub fn expires_at(&self) -> u64 {
        self.request.expires_at()
    }

    /// Whether the window covers `now` (unix seconds).
    #[must_use]
    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.request.start_timestamp && now < self.expires_at()
    }
}
