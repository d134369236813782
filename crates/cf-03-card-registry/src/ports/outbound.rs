//! # Outbound Ports
//!
//! Read access to the card program's ledger state.

use crate::domain::LedgerError;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Address, CardCiphertexts, CardId};
use std::collections::BTreeMap;

/// Read side of the card program - outbound port.
#[async_trait]
pub trait CardLedgerReader: Send + Sync {
    /// Ids of the cards `owner` currently holds.
    async fn owned_cards(&self, program: Address, owner: Address)
        -> Result<Vec<CardId>, LedgerError>;

    /// The four attribute ciphertext handles of `card`.
    async fn card_ciphertexts(
        &self,
        program: Address,
        card: CardId,
    ) -> Result<CardCiphertexts, LedgerError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock ledger: a card table plus an owner map, editable between reads.
#[derive(Default)]
pub struct MockCardLedger {
    cards: RwLock<BTreeMap<CardId, (Address, CardCiphertexts)>>,
    /// Should reads fail?
    pub should_fail: RwLock<bool>,
}

impl MockCardLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a card.
    pub fn put(&self, card: CardId, owner: Address, handles: CardCiphertexts) {
        self.cards.write().insert(card, (owner, handles));
    }

    /// Burn a card.
    pub fn burn(&self, card: CardId) {
        self.cards.write().remove(&card);
    }

    /// Toggle read failures.
    pub fn set_failing(&self, failing: bool) {
        *self.should_fail.write() = failing;
    }
}

#[async_trait]
impl CardLedgerReader for MockCardLedger {
    async fn owned_cards(
        &self,
        _program: Address,
        owner: Address,
    ) -> Result<Vec<CardId>, LedgerError> {
        if *self.should_fail.read() {
            return Err(LedgerError::Unavailable("Mock failure".to_string()));
        }
        Ok(self
            .cards
            .read()
            .iter()
            .filter(|(_, (holder, _))| *holder == owner)
            .map(|(card, _)| *card)
            .collect())
    }

    async fn card_ciphertexts(
        &self,
        _program: Address,
        card: CardId,
    ) -> Result<CardCiphertexts, LedgerError> {
        if *self.should_fail.read() {
            return Err(LedgerError::Unavailable("Mock failure".to_string()));
        }
        self.cards
            .read()
            .get(&card)
            .map(|(_, handles)| *handles)
            .ok_or(LedgerError::UnknownCard(card))
    }
}
