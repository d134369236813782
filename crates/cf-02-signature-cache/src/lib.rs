//! # CF-02 Decryption Signature Cache
//!
//! Time-scoped decryption authorizations keyed by `(account, program)`.
//! A wallet prompt is only issued when no valid authorization is cached,
//! and concurrent requests for the same key share that prompt.
//!
//! **Component ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Module Structure
//!
//! ```text
//! cf-02-signature-cache/
//! ├── domain/          # SignatureCacheError, validity rules
//! ├── ports/           # SignatureCacheApi (inbound), AuthorizationStore (outbound)
//! ├── adapters/        # InMemoryAuthorizationStore
//! ├── application/     # SignatureCache
//! └── config.rs        # SignatureCacheConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::InMemoryAuthorizationStore;
pub use application::SignatureCache;
pub use config::SignatureCacheConfig;
pub use domain::{check_usable, SignatureCacheError, SignatureCacheResult, Unusable};
pub use ports::{AuthorizationStore, SignatureCacheApi};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
