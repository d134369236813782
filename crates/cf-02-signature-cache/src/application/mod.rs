//! # Application Module

pub mod service;

pub use service::SignatureCache;
