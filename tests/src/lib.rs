//! # Card-Fusion Test Suite
//!
//! Cross-component scenarios run against the local development stack: the
//! local FHE runtime and the local card program share one ciphertext store,
//! so encryption, access grants and decryption behave end to end.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # LocalStack: wallet + program + controller
//!     ├── card_lifecycle.rs # mint -> decrypt -> mint -> fuse
//!     ├── concurrency.rs    # operation claims, refresh coalescing
//!     ├── authorization.rs  # signature reuse and expiry
//!     └── session.rs        # account/network changes, deployment
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cf-tests
//! cargo test -p cf-tests integration::session::
//! ```

#![allow(dead_code)]

pub mod integration;
