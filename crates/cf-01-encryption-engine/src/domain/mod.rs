//! # Domain Module
//!
//! Core domain types for the Encryption Engine Binding.

pub mod errors;
pub mod invariants;
pub mod target;

pub use errors::*;
pub use invariants::*;
pub use target::*;
