//! # Card Registry Service
//!
//! Local view of the cards the active account owns. The ledger is the only
//! source of truth: the owned set is rebuilt from a fresh read on every
//! refresh and never patched from operation results.
//!
//! Reads (`load`) and writes (`apply`) are separate so a caller can drop a
//! read that was overtaken by a newer one or by a session change.

use crate::domain::{merge_owned, RegistryError, RegistryResult};
use crate::ports::{CardLedgerReader, CardRegistryApi};
use async_trait::async_trait;
use fusion_telemetry::{log_card_event, log_event, OWNED_CARDS};
use futures::future::try_join_all;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, FusionEvent};
use shared_types::{
    format_address, Address, CardAttributeSet, CardCiphertexts, CardId, CardStats,
    RegistrySnapshot,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const COMPONENT: &str = "cf-03";

/// Result of a ledger read, not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLoad {
    /// Program that was read.
    pub program: Address,
    /// Owner that was read.
    pub owner: Address,
    /// Owned cards and their handles.
    pub cards: BTreeMap<CardId, CardCiphertexts>,
}

impl RegistryLoad {
    /// Owned ids in this read.
    pub fn card_ids(&self) -> BTreeSet<CardId> {
        self.cards.keys().copied().collect()
    }
}

#[derive(Default)]
struct RegistryState {
    owner: Option<Address>,
    cards: BTreeMap<CardId, CardAttributeSet>,
}

/// Card Registry View.
pub struct CardRegistry {
    ledger: Arc<dyn CardLedgerReader>,
    publisher: Arc<dyn EventPublisher>,
    state: RwLock<RegistryState>,
}

impl CardRegistry {
    /// Create an empty registry reading from `ledger`.
    pub fn new(ledger: Arc<dyn CardLedgerReader>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            ledger,
            publisher,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Whether `card` is in the owned set.
    pub fn owns(&self, card: CardId) -> bool {
        self.state.read().cards.contains_key(&card)
    }

    /// Whether `card` is owned and still sealed.
    pub fn is_sealed(&self, card: CardId) -> bool {
        self.state
            .read()
            .cards
            .get(&card)
            .is_some_and(CardAttributeSet::is_sealed)
    }

    /// Number of owned cards.
    pub fn owned_count(&self) -> usize {
        self.state.read().cards.len()
    }

    /// Owned ids in ascending order.
    pub fn owned_ids(&self) -> BTreeSet<CardId> {
        self.state.read().cards.keys().copied().collect()
    }

    /// Owner of the current view.
    pub fn owner(&self) -> Option<Address> {
        self.state.read().owner
    }
}

#[async_trait]
impl CardRegistryApi for CardRegistry {
    async fn load(&self, program: Address, owner: Address) -> RegistryResult<RegistryLoad> {
        let ids = self.ledger.owned_cards(program, owner).await?;
        let handles = try_join_all(
            ids.iter()
                .map(|card| self.ledger.card_ciphertexts(program, *card)),
        )
        .await?;

        Ok(RegistryLoad {
            program,
            owner,
            cards: ids.into_iter().zip(handles).collect(),
        })
    }

    async fn apply(&self, load: RegistryLoad) -> BTreeSet<CardId> {
        let owned = {
            let mut state = self.state.write();
            if state.owner != Some(load.owner) {
                state.cards.clear();
                state.owner = Some(load.owner);
            }
            state.cards = merge_owned(&state.cards, &load.cards);
            state.cards.keys().copied().collect::<BTreeSet<_>>()
        };

        OWNED_CARDS.set(owned.len() as i64);
        log_event!(
            debug,
            COMPONENT,
            "registry refreshed",
            owner = %format_address(&load.owner),
            cards = owned.len()
        );
        self.publisher
            .publish(FusionEvent::RegistryRefreshed {
                owner: load.owner,
                cards: owned.iter().copied().collect(),
            })
            .await;
        owned
    }

    async fn refresh(&self, program: Address, owner: Address) -> RegistryResult<BTreeSet<CardId>> {
        let load = self.load(program, owner).await?;
        Ok(self.apply(load).await)
    }

    fn get_attributes(&self, card: CardId) -> Option<CardAttributeSet> {
        self.state.read().cards.get(&card).copied()
    }

    fn record_revealed(
        &self,
        card: CardId,
        decrypted: &CardCiphertexts,
        stats: CardStats,
    ) -> RegistryResult<()> {
        let mut state = self.state.write();
        let entry = state
            .cards
            .get_mut(&card)
            .ok_or(RegistryError::NotOwned(card))?;
        if entry.handles() != decrypted {
            return Err(RegistryError::HandlesChanged(card));
        }
        *entry = CardAttributeSet::Revealed {
            handles: *decrypted,
            stats,
        };
        log_card_event!(debug, COMPONENT, "card revealed", card);
        Ok(())
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.owner = None;
        state.cards.clear();
        OWNED_CARDS.set(0);
    }

    fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read();
        RegistrySnapshot {
            owner: state.owner,
            cards: state.cards.clone(),
        }
    }
}
