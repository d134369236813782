//! # CF-04 Card Operations
//!
//! The controller every caller talks to. Owns the session, sequences mint,
//! fuse and decrypt over the engine binding (cf-01), the signature cache
//! (cf-02) and the registry view (cf-03), and answers the readiness
//! predicates.
//!
//! **Component ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | One mutating operation at a time | atomic claim + RAII guard |
//! | Validation before network | range and pair checks run first |
//! | No stale results | session generation re-checked after every await |
//! | Ledger is the truth | post-confirmation refresh + reconciliation |
//! | All-or-nothing reveal | four fields or the card stays sealed |
//!
//! ## Module Structure
//!
//! ```text
//! cf-04-card-operations/
//! ├── domain/          # errors, session, operation claims, validation, reconcile
//! ├── algorithms/      # readiness predicates
//! ├── ports/           # CardOperationsApi, CardProgramGateway, DeploymentResolver
//! ├── adapters/        # AddressBook, LocalCardProgram, LocalWallet
//! ├── application/     # CardOperationController
//! └── config.rs        # FusionConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{AddressBook, LocalCardProgram, LocalWallet};
pub use algorithms::ReadinessInputs;
pub use application::CardOperationController;
pub use config::{ConfigError, FusionConfig};
pub use domain::{OperationError, OperationResult, SessionContext};
pub use ports::{
    CardOperationsApi, CardProgramGateway, DeploymentResolver, FuseReceipt, MintReceipt,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
