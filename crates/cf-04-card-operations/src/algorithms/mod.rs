//! # Algorithms
//!
//! Pure readiness predicates.

pub mod readiness;

pub use readiness::*;
