//! # Adapters Layer (Hexagonal Architecture)
//!
//! Outbound engine runtimes. The local runtime serves development chains;
//! the full network runtime is injected by the host application.

mod dev_store;
mod local_runtime;

pub use dev_store::DevCiphertextStore;
pub use local_runtime::{LocalFheInstance, LocalFheRuntime, LocalRuntimeControls};
