//! # Adapters Layer (Hexagonal Architecture)

mod memory_store;

pub use memory_store::InMemoryAuthorizationStore;
