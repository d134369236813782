//! # Local Card Program
//!
//! In-memory card program for development chains. Shares the
//! [`DevCiphertextStore`] with the local engine runtime, so ciphertexts
//! produced by `encrypt` can be consumed here and the access grants issued
//! here govern `user_decrypt`.
//!
//! Fusion adds the parents' attributes pairwise and caps each sum at the
//! attribute maximum.

use crate::ports::{CardProgramGateway, FuseReceipt, MintReceipt};
use async_trait::async_trait;
use cf_01_encryption_engine::{DevCiphertextStore, FheFailure};
use cf_03_card_registry::{CardLedgerReader, LedgerError};
use fusion_telemetry::{log_card_event, log_event};
use parking_lot::{Mutex, RwLock};
use shared_types::{format_address, Address, CardAttribute, CardCiphertexts, CardId, CiphertextHandle};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const COMPONENT: &str = "cf-04";

struct LedgerState {
    next_card: u64,
    cards: BTreeMap<CardId, (Address, CardCiphertexts)>,
}

/// Development card program.
pub struct LocalCardProgram {
    address: Address,
    attribute_cap: u64,
    store: Arc<DevCiphertextStore>,
    state: RwLock<LedgerState>,
    rejection: Mutex<Option<String>>,
    submission_delay_ms: AtomicU64,
    keep_parents: AtomicBool,
    submissions: AtomicU64,
    reads: ReadGauge,
}

/// Owned-card reads served, and how many overlapped at most.
#[derive(Default)]
struct ReadGauge {
    outage: Mutex<Option<String>>,
    delay_ms: AtomicU64,
    served: AtomicU64,
    active: AtomicU64,
    peak: AtomicU64,
}

/// Decrements the active read count when the read ends or is dropped.
struct ActiveRead<'a>(&'a ReadGauge);

impl<'a> ActiveRead<'a> {
    fn enter(gauge: &'a ReadGauge) -> Self {
        gauge.served.fetch_add(1, Ordering::SeqCst);
        let active = gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.peak.fetch_max(active, Ordering::SeqCst);
        Self(gauge)
    }
}

impl Drop for ActiveRead<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LocalCardProgram {
    /// Program deployed at `address`, capping fused attributes at
    /// `attribute_cap`.
    pub fn new(address: Address, attribute_cap: u64, store: Arc<DevCiphertextStore>) -> Self {
        Self {
            address,
            attribute_cap,
            store,
            state: RwLock::new(LedgerState {
                next_card: 1,
                cards: BTreeMap::new(),
            }),
            rejection: Mutex::new(None),
            submission_delay_ms: AtomicU64::new(0),
            keep_parents: AtomicBool::new(false),
            submissions: AtomicU64::new(0),
            reads: ReadGauge::default(),
        }
    }

    /// Program address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Reject every submission with `reason` until cleared.
    pub fn reject_submissions(&self, reason: Option<&str>) {
        *self.rejection.lock() = reason.map(str::to_string);
    }

    /// Hold every submission for `ms` before confirming it.
    pub fn set_submission_delay(&self, ms: u64) {
        self.submission_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Leave fused parents alive. Models a faulty program for
    /// reconciliation tests.
    pub fn set_keep_parents(&self, keep: bool) {
        self.keep_parents.store(keep, Ordering::SeqCst);
    }

    /// Transactions received, including rejected ones.
    pub fn submission_count(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Fail every ledger read with `reason` until cleared. Submissions are
    /// unaffected.
    pub fn fail_reads(&self, reason: Option<&str>) {
        *self.reads.outage.lock() = reason.map(str::to_string);
    }

    /// Hold every owned-card read for `ms`.
    pub fn set_read_delay(&self, ms: u64) {
        self.reads.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Owned-card reads served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.served.load(Ordering::SeqCst)
    }

    /// Largest number of owned-card reads that were in progress at once.
    pub fn peak_concurrent_reads(&self) -> u64 {
        self.reads.peak.load(Ordering::SeqCst)
    }

    /// Re-encrypt `card` under fresh handles with the same values, as any
    /// program-side update of the card would.
    pub fn rotate_handles(&self, card: CardId) -> Result<CardCiphertexts, LedgerError> {
        let mut state = self.state.write();
        let (owner, handles) = state
            .cards
            .get_mut(&card)
            .ok_or(LedgerError::UnknownCard(card))?;
        let mut fresh = [CiphertextHandle::default(); 4];
        for (slot, (_, handle)) in fresh.iter_mut().zip(handles.handles()) {
            let (value, width) = self.store.plaintext(&handle).map_err(rejected)?;
            *slot = self.store.insert_computed(self.address, value, width);
            self.store.allow(*slot, *owner).map_err(rejected)?;
        }
        *handles = CardCiphertexts::from_array(fresh);
        Ok(*handles)
    }

    fn check_read(&self, program: Address) -> Result<(), LedgerError> {
        self.check_program(program)?;
        match self.reads.outage.lock().clone() {
            Some(reason) => Err(LedgerError::Unavailable(reason)),
            None => Ok(()),
        }
    }

    /// Current owner of `card`.
    pub fn owner_of(&self, card: CardId) -> Option<Address> {
        self.state.read().cards.get(&card).map(|(owner, _)| *owner)
    }

    /// Hand `card` to another account.
    pub fn transfer(&self, card: CardId, to: Address) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let entry = state
            .cards
            .get_mut(&card)
            .ok_or(LedgerError::UnknownCard(card))?;
        entry.0 = to;
        Ok(())
    }

    fn check_program(&self, program: Address) -> Result<(), LedgerError> {
        if program != self.address {
            return Err(LedgerError::Rejected(format!(
                "no card program at {}",
                format_address(&program)
            )));
        }
        Ok(())
    }

    async fn begin_submission(&self, program: Address) -> Result<(), LedgerError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.check_program(program)?;

        let delay = self.submission_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(reason) = self.rejection.lock().clone() {
            return Err(LedgerError::Rejected(reason));
        }
        Ok(())
    }

    fn owned_by(&self, card: CardId, sender: Address) -> Result<CardCiphertexts, LedgerError> {
        match self.state.read().cards.get(&card) {
            Some((owner, handles)) if *owner == sender => Ok(*handles),
            Some(_) => Err(LedgerError::Rejected(format!(
                "card {card} is not owned by {}",
                format_address(&sender)
            ))),
            None => Err(LedgerError::UnknownCard(card)),
        }
    }

    fn fused_attribute(
        &self,
        attribute: CardAttribute,
        a: &CardCiphertexts,
        b: &CardCiphertexts,
        owner: Address,
    ) -> Result<CiphertextHandle, FheFailure> {
        let (left, width) = self.store.plaintext(&a.get(attribute))?;
        let (right, _) = self.store.plaintext(&b.get(attribute))?;
        let value = left.saturating_add(right).min(self.attribute_cap);

        let handle = self.store.insert_computed(self.address, value, width);
        self.store.allow(handle, owner)?;
        Ok(handle)
    }
}

fn rejected(failure: FheFailure) -> LedgerError {
    LedgerError::Rejected(failure.to_string())
}

#[async_trait]
impl CardLedgerReader for LocalCardProgram {
    async fn owned_cards(
        &self,
        program: Address,
        owner: Address,
    ) -> Result<Vec<CardId>, LedgerError> {
        let _read = ActiveRead::enter(&self.reads);
        let delay = self.reads.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_read(program)?;
        Ok(self
            .state
            .read()
            .cards
            .iter()
            .filter(|(_, (holder, _))| *holder == owner)
            .map(|(card, _)| *card)
            .collect())
    }

    async fn card_ciphertexts(
        &self,
        program: Address,
        card: CardId,
    ) -> Result<CardCiphertexts, LedgerError> {
        self.check_read(program)?;
        self.state
            .read()
            .cards
            .get(&card)
            .map(|(_, handles)| *handles)
            .ok_or(LedgerError::UnknownCard(card))
    }
}

#[async_trait]
impl CardProgramGateway for LocalCardProgram {
    async fn submit_mint(
        &self,
        program: Address,
        sender: Address,
        attributes: CardCiphertexts,
    ) -> Result<MintReceipt, LedgerError> {
        self.begin_submission(program).await?;

        for (_, handle) in attributes.handles() {
            self.store
                .consume_input(handle, program, sender)
                .map_err(rejected)?;
            self.store.allow(handle, sender).map_err(rejected)?;
        }

        let card_id = {
            let mut state = self.state.write();
            let card_id = CardId(state.next_card);
            state.next_card += 1;
            state.cards.insert(card_id, (sender, attributes));
            card_id
        };
        log_card_event!(debug, COMPONENT, "local program minted card", card_id);
        Ok(MintReceipt { card_id })
    }

    async fn submit_fuse(
        &self,
        program: Address,
        sender: Address,
        a: CardId,
        b: CardId,
    ) -> Result<FuseReceipt, LedgerError> {
        self.begin_submission(program).await?;
        if a == b {
            return Err(LedgerError::Rejected(format!("cannot fuse card {a} with itself")));
        }
        let first = self.owned_by(a, sender)?;
        let second = self.owned_by(b, sender)?;

        let mut fused = Vec::with_capacity(CardAttribute::ALL.len());
        for attribute in CardAttribute::ALL {
            fused.push(
                self.fused_attribute(attribute, &first, &second, sender)
                    .map_err(rejected)?,
            );
        }
        let handles: [CiphertextHandle; 4] = fused
            .try_into()
            .map_err(|_| LedgerError::Rejected("fusion produced a malformed card".to_string()))?;

        let new_card_id = {
            let mut state = self.state.write();
            if !self.keep_parents.load(Ordering::SeqCst) {
                state.cards.remove(&a);
                state.cards.remove(&b);
            }
            let new_card_id = CardId(state.next_card);
            state.next_card += 1;
            state
                .cards
                .insert(new_card_id, (sender, CardCiphertexts::from_array(handles)));
            new_card_id
        };
        log_event!(
            debug,
            COMPONENT,
            "local program fused cards",
            parents = %format!("{a}+{b}"),
            child = %new_card_id
        );
        Ok(FuseReceipt { new_card_id })
    }
}
