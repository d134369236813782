//! # Application Layer
//!
//! The controller service wiring engine, signature cache and registry.

pub mod service;

pub use service::CardOperationController;
