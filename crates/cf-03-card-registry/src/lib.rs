//! # CF-03 Card Registry View
//!
//! The set of cards the active account owns, each `Sealed` (handles only)
//! or `Revealed` (all four attributes decrypted).
//!
//! **Component ID:** 3
//!
//! ## Rules
//!
//! - A refresh replaces the owned set; burned cards disappear.
//! - Revealed stats survive a refresh while the card is still owned.
//! - A burned card is never resurrected by a late reveal.
//!
//! ## Module Structure
//!
//! ```text
//! cf-03-card-registry/
//! ├── domain/          # LedgerError, RegistryError, merge rule
//! ├── ports/           # CardRegistryApi (inbound), CardLedgerReader (outbound)
//! └── application/     # CardRegistry, RegistryLoad
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{CardRegistry, RegistryLoad};
pub use domain::{merge_owned, LedgerError, RegistryError, RegistryResult};
pub use ports::{CardLedgerReader, CardRegistryApi, MockCardLedger};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
