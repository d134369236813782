//! # Domain Module
//!
//! Errors, session context, operation claims, validation and
//! post-operation reconciliation rules.

pub mod errors;
pub mod operation;
pub mod reconcile;
pub mod session;
pub mod validation;

pub use errors::*;
pub use operation::*;
pub use reconcile::*;
pub use session::*;
pub use validation::*;
