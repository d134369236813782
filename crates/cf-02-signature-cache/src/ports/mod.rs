//! # Ports Module
//!
//! Inbound cache API and the outbound authorization store.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
