//! # Shared Types Crate
//!
//! Domain entities, lifecycle types and external-collaborator ports shared by
//! the card-fusion subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type is defined here.
//! - **Opaque Ciphertexts**: `CiphertextHandle` never carries plaintext.
//! - **All-or-Nothing Reveal**: `CardAttributeSet` cannot represent a
//!   half-revealed card.

pub mod authorization;
pub mod clock;
pub mod entities;
pub mod status;
pub mod wallet;

pub use authorization::*;
pub use clock::*;
pub use entities::*;
pub use status::*;
pub use wallet::*;
