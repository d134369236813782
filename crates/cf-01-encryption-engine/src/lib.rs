//! # CF-01 Encryption Engine Binding
//!
//! Lifecycle of the network-scoped FHE engine: initialization for a
//! `(chain, program)` target, client-side encryption of program inputs and
//! user decryption requests under a signed authorization.
//!
//! **Component ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | One engine per target | generation counter, last request wins |
//! | No stale adoption | superseded completions are discarded |
//! | No expired decryption | validity checked before every attempt |
//! | Bounded latency | init and per-attempt decrypt timeouts |
//!
//! ## Module Structure
//!
//! ```text
//! cf-01-encryption-engine/
//! ├── domain/          # EngineTarget, EngineError, invariants
//! ├── ports/           # EncryptionEngineApi (inbound), FheRuntime (outbound)
//! ├── adapters/        # LocalFheRuntime + DevCiphertextStore
//! ├── application/     # EngineBinding
//! └── config.rs        # EngineConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod test_support;

// Re-exports
pub use adapters::{DevCiphertextStore, LocalFheInstance, LocalFheRuntime, LocalRuntimeControls};
pub use application::{EngineBinding, EngineRuntimes};
pub use config::EngineConfig;
pub use domain::{
    check_authorization_live, check_encodable, EngineError, EngineResult, EngineTarget,
};
pub use ports::{EncryptionEngineApi, FheFailure, FheInstance, FheRuntime};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
