//! # Application Module
//!
//! Application service driving the engine lifecycle.

pub mod service;

pub use service::{EngineBinding, EngineRuntimes};
