//! # Ports Module
//!
//! Hexagonal architecture ports (inbound controller API, outbound card
//! program and deployment resolution).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
