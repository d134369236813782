//! # Domain Module
//!
//! Registry errors and the reconciliation rule for a fresh ledger read.

pub mod errors;
pub mod merge;

pub use errors::*;
pub use merge::*;
