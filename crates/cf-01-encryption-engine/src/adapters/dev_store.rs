//! # Development Ciphertext Store
//!
//! Shared handle table backing the local runtime. Plays the role of the
//! coprocessor's ciphertext storage and the program access list on
//! development chains: handles are opaque to callers, plaintexts never leave
//! the store except through an authorized decryption or a simulated
//! homomorphic operation performed by the local card program.

use crate::ports::FheFailure;
use parking_lot::RwLock;
use shared_crypto::KeccakHasher;
use shared_types::{format_address, Address, CiphertextHandle, FieldWidth};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// One stored ciphertext.
#[derive(Debug, Clone)]
struct DevCiphertext {
    plaintext: u64,
    width: FieldWidth,
    program: Address,
    /// Account that encrypted it as a program input, if it is one.
    input_of: Option<Address>,
    /// Whether the input was already consumed by a program call.
    consumed: bool,
    /// Accounts allowed to decrypt.
    allowed: HashSet<Address>,
}

/// Shared development ciphertext table.
#[derive(Debug, Default)]
pub struct DevCiphertextStore {
    entries: RwLock<HashMap<CiphertextHandle, DevCiphertext>>,
    counter: AtomicU64,
}

impl DevCiphertextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&self, program: &Address) -> CiphertextHandle {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = KeccakHasher::new();
        hasher.update(b"dev-ciphertext").update(program).update(&n.to_be_bytes());
        CiphertextHandle(hasher.finalize())
    }

    /// Store a fresh input encrypted by `user` for `program`.
    pub fn insert_input(
        &self,
        program: Address,
        user: Address,
        value: u64,
        width: FieldWidth,
    ) -> CiphertextHandle {
        let handle = self.next_handle(&program);
        self.entries.write().insert(
            handle,
            DevCiphertext {
                plaintext: value,
                width,
                program,
                input_of: Some(user),
                consumed: false,
                allowed: HashSet::new(),
            },
        );
        handle
    }

    /// Store a value computed by `program` (e.g. a fusion result).
    pub fn insert_computed(&self, program: Address, value: u64, width: FieldWidth) -> CiphertextHandle {
        let handle = self.next_handle(&program);
        self.entries.write().insert(
            handle,
            DevCiphertext {
                plaintext: value,
                width,
                program,
                input_of: None,
                consumed: true,
                allowed: HashSet::new(),
            },
        );
        handle
    }

    /// Accept `handle` as a call argument of `sender` to `program`.
    ///
    /// Inputs are bound to the encrypting account and the target program and
    /// can be consumed once.
    pub fn consume_input(
        &self,
        handle: CiphertextHandle,
        program: Address,
        sender: Address,
    ) -> Result<(), FheFailure> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&handle)
            .ok_or(FheFailure::UnknownHandle(handle))?;

        if entry.program != program {
            return Err(FheFailure::AccessDenied(format!(
                "input {handle} was encrypted for another program"
            )));
        }
        if entry.input_of != Some(sender) {
            return Err(FheFailure::AccessDenied(format!(
                "input {handle} was not encrypted by {}",
                format_address(&sender)
            )));
        }
        if entry.consumed {
            return Err(FheFailure::AccessDenied(format!(
                "input {handle} was already consumed"
            )));
        }
        entry.consumed = true;
        Ok(())
    }

    /// Grant `account` decryption rights on `handle`.
    pub fn allow(&self, handle: CiphertextHandle, account: Address) -> Result<(), FheFailure> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&handle)
            .ok_or(FheFailure::UnknownHandle(handle))?;
        entry.allowed.insert(account);
        Ok(())
    }

    /// Whether `account` may decrypt `handle`.
    pub fn is_allowed(&self, handle: &CiphertextHandle, account: &Address) -> bool {
        self.entries
            .read()
            .get(handle)
            .is_some_and(|entry| entry.allowed.contains(account))
    }

    /// Plaintext and width of `handle`. For the local runtime and the local
    /// card program only.
    pub fn plaintext(&self, handle: &CiphertextHandle) -> Result<(u64, FieldWidth), FheFailure> {
        self.entries
            .read()
            .get(handle)
            .map(|entry| (entry.plaintext, entry.width))
            .ok_or(FheFailure::UnknownHandle(*handle))
    }

    /// Program that owns `handle`.
    pub fn program_of(&self, handle: &CiphertextHandle) -> Option<Address> {
        self.entries.read().get(handle).map(|entry| entry.program)
    }

    /// Number of stored ciphertexts.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
