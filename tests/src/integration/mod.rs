//! Cross-component integration scenarios.

pub mod fixtures;

mod authorization;
mod card_lifecycle;
mod concurrency;
mod session;
