//! # Shared Crypto
//!
//! Wallet-side primitives used by the card-fusion stack.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Authorization digests, addresses, handles |
//! | `ecdsa` | secp256k1 (recoverable) | Wallet signing, signer recovery |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    address_from_pubkey, recover_address, recover_address_prehash, RecoverableSignature,
    Secp256k1KeyPair, RECOVERABLE_SIGNATURE_LEN,
};
pub use errors::CryptoError;
pub use hashing::{keccak256, KeccakHasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
