//! # Domain Module
//!
//! Errors and validity rules of the signature cache.

pub mod errors;
pub mod validity;

pub use errors::*;
pub use validity::*;
