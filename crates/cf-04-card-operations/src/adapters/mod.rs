//! # Adapters Module
//!
//! Address book, local development card program and local wallet.

mod address_book;
mod local_program;
mod local_wallet;

pub use address_book::AddressBook;
pub use local_program::LocalCardProgram;
pub use local_wallet::LocalWallet;
