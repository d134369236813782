//! # Card Operation Controller
//!
//! Orchestrates the session lifecycle and the three mutating operations on
//! top of the engine binding, the signature cache and the registry view.
//!
//! ## Session lifecycle
//!
//! ```text
//! connect ──► close previous ──► resolve deployment ──► open ──► init engine ──► refresh
//!                                      │
//!                                      └── none ──► DeploymentStatus::NotDeployed
//! ```
//!
//! Every close advances the session generation. An operation captures the
//! session it started under and re-checks it after each suspension point;
//! once the session is gone its result is discarded with `StaleSession`.
//!
//! ## Operations
//!
//! At most one of mint, fuse and decrypt runs at a time. A refresh may run
//! alongside them; concurrent refresh requests coalesce onto the one in
//! flight. Reconciliation after mint and fuse always uses a refresh that
//! started after the transaction was confirmed.

use crate::algorithms::{self, ReadinessInputs};
use crate::config::FusionConfig;
use crate::domain::{
    validate_attributes, validate_fusion_pair, verify_fuse, verify_mint, OperationError,
    OperationGuard, OperationResult, OperationSlot, SessionContext, SessionSlot,
};
use crate::ports::{CardOperationsApi, CardProgramGateway, DeploymentResolver};
use async_trait::async_trait;
use cf_01_encryption_engine::{EncryptionEngineApi, EngineBinding, EngineError, EngineRuntimes};
use cf_02_signature_cache::{InMemoryAuthorizationStore, SignatureCache, SignatureCacheApi};
use cf_03_card_registry::{CardLedgerReader, CardRegistry, CardRegistryApi};
use fusion_telemetry::{
    log_card_event, log_event, metric_inc, CARDS_FUSED, CARDS_MINTED, CARDS_REVEALED,
    CONSISTENCY_ANOMALIES, OPERATIONS,
};
use futures::future::join_all;
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventPublisher, FusionEvent, InMemoryEventBus, Subscription};
use shared_types::{
    format_address, Address, CardAttribute, CardCiphertexts, CardId, CardStats, ChainId, Clock,
    ControllerSnapshot, DeploymentStatus, MutatingOperation, SessionInfo, WalletError,
    WalletProvider,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const COMPONENT: &str = "cf-04";

#[derive(Debug, Clone, Default)]
struct StatusLine {
    identity: Option<(Address, ChainId)>,
    deployment: DeploymentStatus,
    last_error: Option<String>,
    message: String,
}

#[derive(Default)]
struct RefreshTracker {
    started: u64,
    completed: u64,
    last: Option<OperationResult<BTreeSet<CardId>>>,
}

impl RefreshTracker {
    fn in_flight(&self) -> Option<u64> {
        (self.started > self.completed).then_some(self.started)
    }

    fn result_of(&self, refresh: u64) -> Option<OperationResult<BTreeSet<CardId>>> {
        if self.completed >= refresh {
            self.last.clone()
        } else {
            None
        }
    }
}

/// Clears the refreshing flag however the refresh ends.
struct RefreshMark<'a>(&'a Mutex<OperationSlot>);

impl<'a> RefreshMark<'a> {
    fn set(slot: &'a Mutex<OperationSlot>) -> Self {
        slot.lock().set_refreshing(true);
        Self(slot)
    }
}

impl Drop for RefreshMark<'_> {
    fn drop(&mut self) {
        self.0.lock().set_refreshing(false);
    }
}

/// Card Operation Controller.
pub struct CardOperationController {
    config: FusionConfig,
    wallet: Arc<dyn WalletProvider>,
    resolver: Arc<dyn DeploymentResolver>,
    gateway: Arc<dyn CardProgramGateway>,
    engine: Arc<EngineBinding>,
    signatures: Arc<SignatureCache>,
    registry: Arc<CardRegistry>,
    bus: Arc<InMemoryEventBus>,
    session: Mutex<SessionSlot>,
    operations: Mutex<OperationSlot>,
    status: Mutex<StatusLine>,
    refresh_lock: tokio::sync::Mutex<()>,
    refreshes: Mutex<RefreshTracker>,
}

impl CardOperationController {
    /// Wire a controller and its components.
    ///
    /// `program` serves both ledger reads (registry) and transactions.
    pub fn new<G>(
        config: FusionConfig,
        wallet: Arc<dyn WalletProvider>,
        resolver: Arc<dyn DeploymentResolver>,
        program: Arc<G>,
        runtimes: EngineRuntimes,
        clock: Arc<dyn Clock>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self
    where
        G: CardProgramGateway + 'static,
    {
        let ledger: Arc<dyn CardLedgerReader> = program.clone();
        let gateway: Arc<dyn CardProgramGateway> = program;

        let engine = Arc::new(EngineBinding::new(
            config.engine.clone(),
            runtimes,
            Arc::clone(&clock),
            bus.clone(),
        ));
        let signatures = Arc::new(SignatureCache::new(
            config.signatures.clone(),
            Arc::new(InMemoryAuthorizationStore::new()),
            clock,
            bus.clone(),
        ));
        let registry = Arc::new(CardRegistry::new(ledger, bus.clone()));

        Self {
            config,
            wallet,
            resolver,
            gateway,
            engine,
            signatures,
            registry,
            bus,
            session: Mutex::new(SessionSlot::default()),
            operations: Mutex::new(OperationSlot::default()),
            status: Mutex::new(StatusLine::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
            refreshes: Mutex::new(RefreshTracker::default()),
        }
    }

    /// Engine binding.
    pub fn engine(&self) -> &Arc<EngineBinding> {
        &self.engine
    }

    /// Signature cache.
    pub fn signatures(&self) -> &Arc<SignatureCache> {
        &self.signatures
    }

    /// Registry view.
    pub fn registry(&self) -> &Arc<CardRegistry> {
        &self.registry
    }

    /// Event bus notifications go out on.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Configuration in use.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Active session, if any.
    pub fn session(&self) -> Option<SessionContext> {
        self.session.lock().current().cloned()
    }

    fn readiness_inputs(&self) -> ReadinessInputs {
        let cards = self.registry.snapshot().cards;
        ReadinessInputs {
            engine_ready: self.engine.status().is_ready(),
            wallet_connected: self.session.lock().current().is_some(),
            operation: self.operations.lock().state(),
            owned: cards.keys().copied().collect(),
            sealed: cards
                .iter()
                .filter(|(_, attributes)| attributes.is_sealed())
                .map(|(card, _)| *card)
                .collect(),
        }
    }

    // =========================================================================
    // STATUS AND NOTIFICATIONS
    // =========================================================================

    async fn publish_state(&self) {
        let snapshot = self.snapshot();
        self.bus
            .publish(FusionEvent::StateChanged(Box::new(snapshot)))
            .await;
    }

    async fn set_message(&self, message: &str) {
        self.status.lock().message = message.to_string();
        self.publish_state().await;
    }

    async fn finish<T>(
        &self,
        operation: &'static str,
        result: OperationResult<T>,
        on_success: impl FnOnce(&T) -> (String, Vec<FusionEvent>),
    ) -> OperationResult<T> {
        match &result {
            Ok(value) => {
                let (message, events) = on_success(value);
                metric_inc!(OPERATIONS, &[operation, "success"]);
                {
                    let mut status = self.status.lock();
                    status.last_error = None;
                    status.message = message;
                }
                for event in events {
                    self.bus.publish(event).await;
                }
            }
            Err(err) => self.record_failure(operation, err).await,
        }
        self.publish_state().await;
        result
    }

    async fn record_failure(&self, operation: &'static str, err: &OperationError) {
        let outcome = match err {
            OperationError::StaleSession => "stale",
            OperationError::ConsistencyAnomaly { .. } => "anomaly",
            OperationError::InvalidAttributeRange { .. }
            | OperationError::InvalidFusionPair(_)
            | OperationError::OperationInProgress { .. }
            | OperationError::CardNotOwned(_)
            | OperationError::CardAlreadyRevealed(_)
            | OperationError::WalletNotConnected
            | OperationError::NotDeployed { .. } => "rejected",
            _ => "failed",
        };
        metric_inc!(OPERATIONS, &[operation, outcome]);

        match err {
            OperationError::ConsistencyAnomaly {
                operation: mutating,
                detail,
            } => {
                metric_inc!(CONSISTENCY_ANOMALIES);
                log_event!(
                    error,
                    COMPONENT,
                    "ledger state does not match the confirmed transaction",
                    operation = %mutating,
                    detail = %detail
                );
                self.bus
                    .publish(FusionEvent::ConsistencyAnomaly {
                        operation: *mutating,
                        detail: detail.clone(),
                    })
                    .await;
            }
            OperationError::StaleSession => {
                log_event!(info, COMPONENT, "result discarded, session changed", operation);
            }
            _ => {
                log_event!(warn, COMPONENT, "operation failed", operation, error = %err);
            }
        }

        // These leave the status line to the session or operation that owns it
        let surfaced = !matches!(
            err,
            OperationError::StaleSession
                | OperationError::OperationInProgress { .. }
                | OperationError::InvalidAttributeRange { .. }
                | OperationError::InvalidFusionPair(_)
                | OperationError::NotDeployed { .. }
        );
        if surfaced {
            let mut status = self.status.lock();
            status.last_error = Some(err.to_string());
            status.message = format!("{} failed: {err}", title(operation));
        }

        self.bus
            .publish(FusionEvent::OperationFailed {
                operation: operation.to_string(),
                error: err.to_string(),
            })
            .await;
    }

    // =========================================================================
    // SESSION LIFECYCLE
    // =========================================================================

    async fn read_wallet(&self) -> Result<(Address, ChainId), WalletError> {
        Ok((self.wallet.account().await?, self.wallet.chain_id().await?))
    }

    fn require_session(&self) -> OperationResult<SessionContext> {
        self.session
            .lock()
            .current()
            .cloned()
            .ok_or(OperationError::WalletNotConnected)
    }

    fn ensure_current(&self, session: &SessionContext) -> OperationResult<()> {
        self.session.lock().ensure_current(session)
    }

    fn require_engine_ready(&self) -> OperationResult<()> {
        let status = self.engine.status();
        if status.is_ready() {
            Ok(())
        } else {
            Err(OperationError::EngineNotReady(format!(
                "engine is {}",
                status.label()
            )))
        }
    }

    /// Drop the active session. Authorizations of its account are dropped
    /// unless `next_account` is the same account.
    async fn close_session(&self, next_account: Option<Address>) -> u64 {
        let (previous, generation) = self.session.lock().close();
        self.operations.lock().abandon();
        self.status.lock().deployment = DeploymentStatus::Unknown;

        if let Some(previous) = previous {
            self.engine.teardown().await;
            self.registry.clear();
            if next_account != Some(previous.account) {
                if let Err(e) = self.signatures.invalidate_user(previous.account).await {
                    log_event!(warn, COMPONENT, "failed to drop authorizations", error = %e);
                }
            }
            log_event!(
                info,
                COMPONENT,
                "session closed",
                session = previous.id,
                account = %format_address(&previous.account),
                chain_id = previous.chain_id
            );
        }
        generation
    }

    async fn establish(&self) -> OperationResult<SessionInfo> {
        let identity = self.read_wallet().await;
        let next_account = identity.as_ref().ok().map(|(account, _)| *account);
        let generation = self.close_session(next_account).await;

        self.status.lock().identity = identity.as_ref().ok().copied();
        let (account, chain_id) = identity?;
        self.open_session(generation, account, chain_id).await
    }

    async fn open_session(
        &self,
        generation: u64,
        account: Address,
        chain_id: ChainId,
    ) -> OperationResult<SessionInfo> {
        let Some(deployment) = self.resolver.resolve(chain_id).await else {
            if self.session.lock().generation() != generation {
                return Err(OperationError::StaleSession);
            }
            {
                let mut status = self.status.lock();
                status.deployment = DeploymentStatus::NotDeployed { chain_id };
                status.message = format!("Card program is not deployed on chain {chain_id}");
            }
            log_event!(warn, COMPONENT, "card program not deployed", chain_id);
            return Err(OperationError::NotDeployed { chain_id });
        };

        let session =
            self.session
                .lock()
                .open(generation, account, chain_id, deployment.clone())?;
        {
            let mut status = self.status.lock();
            status.deployment = DeploymentStatus::Deployed(deployment);
            status.last_error = None;
        }
        log_event!(
            info,
            COMPONENT,
            "session opened",
            session = session.id,
            account = %format_address(&account),
            chain_id,
            program = %format_address(&session.program())
        );
        self.set_message("Initializing encryption engine...").await;

        if let Err(e) = self.signatures.purge_expired().await {
            log_event!(warn, COMPONENT, "failed to purge expired authorizations", error = %e);
        }

        let initialized = self
            .engine
            .initialize(chain_id, session.program(), Arc::clone(&self.wallet))
            .await;
        self.ensure_current(&session)?;
        initialized?;

        self.status.lock().message = "Loading cards...".to_string();
        self.fresh_refresh(&session).await?;
        Ok(session.info())
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// A refresh that starts now, never one already in flight.
    async fn fresh_refresh(&self, session: &SessionContext) -> OperationResult<BTreeSet<CardId>> {
        let _turn = self.refresh_lock.lock().await;
        let refresh = {
            let mut refreshes = self.refreshes.lock();
            refreshes.started += 1;
            refreshes.started
        };
        let mark = RefreshMark::set(&self.operations);
        self.publish_state().await;

        let result = self.load_and_apply(session).await;

        drop(mark);
        {
            let mut refreshes = self.refreshes.lock();
            refreshes.completed = refresh;
            refreshes.last = Some(result.clone());
        }
        result
    }

    async fn load_and_apply(&self, session: &SessionContext) -> OperationResult<BTreeSet<CardId>> {
        let load = self
            .registry
            .load(session.program(), session.account)
            .await?;
        self.ensure_current(session)?;
        Ok(self.registry.apply(load).await)
    }

    /// Refresh after a confirmed transaction. The card exists on the ledger
    /// at this point, so a failed read is an anomaly rather than a failed
    /// transaction.
    async fn confirmed_refresh(
        &self,
        session: &SessionContext,
        operation: MutatingOperation,
        card: CardId,
    ) -> OperationResult<BTreeSet<CardId>> {
        self.fresh_refresh(session).await.map_err(|err| match err {
            OperationError::StaleSession => err,
            other => OperationError::ConsistencyAnomaly {
                operation,
                detail: format!("card {card} was confirmed but reading it back failed: {other}"),
            },
        })
    }

    async fn refresh_coalesced(&self) -> OperationResult<BTreeSet<CardId>> {
        let session = self.require_session()?;

        let in_flight = self.refreshes.lock().in_flight();
        if let Some(refresh) = in_flight {
            drop(self.refresh_lock.lock().await);
            if let Some(result) = self.refreshes.lock().result_of(refresh) {
                log_event!(debug, COMPONENT, "joined refresh in flight", refresh);
                return result;
            }
        }

        self.status.lock().message = "Refreshing cards...".to_string();
        self.fresh_refresh(&session).await
    }

    // =========================================================================
    // MUTATING OPERATIONS
    // =========================================================================

    async fn run_mint(&self, stats: CardStats) -> OperationResult<CardId> {
        validate_attributes(&stats, self.config.attribute_min, self.config.attribute_max)?;
        let session = self.require_session()?;
        self.require_engine_ready()?;
        let _guard = OperationGuard::claim(&self.operations, MutatingOperation::Minting)?;

        self.set_message("Encrypting attributes...").await;
        let width = self.config.attribute_width;
        let account = session.account;
        let (attack, defense, rarity, special_power) = futures::try_join!(
            self.engine.encrypt(stats.attack, width, account),
            self.engine.encrypt(stats.defense, width, account),
            self.engine.encrypt(stats.rarity, width, account),
            self.engine.encrypt(stats.special_power, width, account),
        )?;
        self.ensure_current(&session)?;

        self.set_message("Submitting mint transaction...").await;
        let before = self.registry.owned_ids();
        let receipt = self
            .gateway
            .submit_mint(
                session.program(),
                account,
                CardCiphertexts::from_array([attack, defense, rarity, special_power]),
            )
            .await?;
        self.ensure_current(&session)?;
        log_card_event!(info, COMPONENT, "mint confirmed", receipt.card_id);

        let after = self
            .confirmed_refresh(&session, MutatingOperation::Minting, receipt.card_id)
            .await?;
        let card = verify_mint(&before, &after, receipt.card_id).map_err(|detail| {
            OperationError::ConsistencyAnomaly {
                operation: MutatingOperation::Minting,
                detail,
            }
        })?;
        if !self.registry.is_sealed(card) {
            return Err(OperationError::ConsistencyAnomaly {
                operation: MutatingOperation::Minting,
                detail: format!("minted card {card} is not sealed"),
            });
        }
        Ok(card)
    }

    async fn run_fuse(&self, a: CardId, b: CardId) -> OperationResult<CardId> {
        validate_fusion_pair(a, b)?;
        let session = self.require_session()?;
        self.require_engine_ready()?;
        for card in [a, b] {
            if !self.registry.owns(card) {
                return Err(OperationError::CardNotOwned(card));
            }
        }
        let _guard = OperationGuard::claim(&self.operations, MutatingOperation::Fusing)?;

        self.set_message("Fusing cards...").await;
        let before = self.registry.owned_ids();
        let receipt = self
            .gateway
            .submit_fuse(session.program(), session.account, a, b)
            .await?;
        self.ensure_current(&session)?;
        log_card_event!(info, COMPONENT, "fusion confirmed", receipt.new_card_id);

        let after = self
            .confirmed_refresh(&session, MutatingOperation::Fusing, receipt.new_card_id)
            .await?;
        verify_fuse(&before, &after, (a, b), receipt.new_card_id).map_err(|detail| {
            OperationError::ConsistencyAnomaly {
                operation: MutatingOperation::Fusing,
                detail,
            }
        })
    }

    async fn run_decrypt(&self, card: CardId) -> OperationResult<CardStats> {
        let session = self.require_session()?;
        let handles = match self.registry.get_attributes(card) {
            None => return Err(OperationError::CardNotOwned(card)),
            Some(attributes) if attributes.is_revealed() => {
                return Err(OperationError::CardAlreadyRevealed(card))
            }
            Some(attributes) => *attributes.handles(),
        };
        let _guard = OperationGuard::claim(&self.operations, MutatingOperation::Decrypting)?;

        self.set_message("Requesting decryption signature...").await;
        let authorization = self
            .signatures
            .get_or_create(session.account, session.program(), self.wallet.as_ref())
            .await?;
        self.ensure_current(&session)?;

        self.set_message("Decrypting attributes...").await;
        let authorization = &authorization;
        let results = join_all(handles.handles().into_iter().map(|(attribute, handle)| async move {
            (
                attribute,
                self.engine.request_decryption(handle, authorization).await,
            )
        }))
        .await;

        let mut values = [0u64; 4];
        let mut failures: Vec<(CardAttribute, EngineError)> = Vec::new();
        for (index, (attribute, result)) in results.into_iter().enumerate() {
            match result {
                Ok(value) => values[index] = value,
                Err(e) => failures.push((attribute, e)),
            }
        }

        if failures
            .iter()
            .any(|(_, e)| matches!(e, EngineError::AuthorizationExpired { .. }))
        {
            if let Err(e) = self
                .signatures
                .invalidate(session.account, session.program())
                .await
            {
                log_event!(warn, COMPONENT, "failed to drop expired authorization", error = %e);
            }
        }

        if let Some((_, first)) = failures.first() {
            let shared_cause = failures.len() == CardAttribute::ALL.len()
                && failures
                    .iter()
                    .all(|(_, e)| std::mem::discriminant(e) == std::mem::discriminant(first));
            if shared_cause {
                return Err(first.clone().into());
            }
            return Err(OperationError::DecryptionIncomplete {
                failed: failures.into_iter().map(|(attribute, _)| attribute).collect(),
            });
        }

        self.ensure_current(&session)?;
        let stats = CardStats::new(values[0], values[1], values[2], values[3]);
        self.registry.record_revealed(card, &handles, stats)?;
        Ok(stats)
    }
}

fn title(operation: &str) -> &'static str {
    match operation {
        "connect" => "Connection",
        "mint" => "Mint",
        "fuse" => "Fusion",
        "decrypt" => "Decryption",
        "refresh" => "Refresh",
        _ => "Operation",
    }
}

#[async_trait]
impl CardOperationsApi for CardOperationController {
    async fn connect(&self) -> OperationResult<SessionInfo> {
        let result = self.establish().await;
        self.finish("connect", result, |info| {
            (format!("Connected to chain {}", info.chain_id), Vec::new())
        })
        .await
    }

    async fn sync_wallet(&self) -> OperationResult<bool> {
        let observed = self.read_wallet().await.ok();
        let known = self.status.lock().identity;
        if observed == known {
            return Ok(false);
        }

        match observed {
            Some((account, chain_id)) => {
                log_event!(
                    info,
                    COMPONENT,
                    "wallet changed, rebuilding session",
                    account = %format_address(&account),
                    chain_id
                );
                self.connect().await.map(|_| true)
            }
            None => {
                self.disconnect().await;
                Ok(true)
            }
        }
    }

    async fn disconnect(&self) {
        self.close_session(None).await;
        {
            let mut status = self.status.lock();
            *status = StatusLine {
                message: "Disconnected".to_string(),
                ..StatusLine::default()
            };
        }
        self.publish_state().await;
    }

    async fn mint(&self, stats: CardStats) -> OperationResult<CardId> {
        let result = self.run_mint(stats).await;
        self.finish(MutatingOperation::Minting.label(), result, |card| {
            metric_inc!(CARDS_MINTED);
            (
                format!("Mint completed: card {card}"),
                vec![FusionEvent::CardMinted { card_id: *card }],
            )
        })
        .await
    }

    async fn fuse(&self, a: CardId, b: CardId) -> OperationResult<CardId> {
        let result = self.run_fuse(a, b).await;
        self.finish(MutatingOperation::Fusing.label(), result, |child| {
            metric_inc!(CARDS_FUSED);
            (
                format!("Fusion completed: card {child}"),
                vec![FusionEvent::CardsFused {
                    parents: (a, b),
                    child: *child,
                }],
            )
        })
        .await
    }

    async fn decrypt_attributes(&self, card: CardId) -> OperationResult<CardStats> {
        let result = self.run_decrypt(card).await;
        self.finish(MutatingOperation::Decrypting.label(), result, |stats| {
            metric_inc!(CARDS_REVEALED);
            (
                format!("Card {card} revealed"),
                vec![FusionEvent::CardRevealed {
                    card_id: card,
                    stats: *stats,
                }],
            )
        })
        .await
    }

    async fn refresh(&self) -> OperationResult<BTreeSet<CardId>> {
        let result = self.refresh_coalesced().await;
        self.finish("refresh", result, |owned| {
            (format!("Found {} cards", owned.len()), Vec::new())
        })
        .await
    }

    fn can_mint(&self) -> bool {
        algorithms::can_mint(&self.readiness_inputs())
    }

    fn can_fuse(&self) -> bool {
        algorithms::can_fuse(&self.readiness_inputs())
    }

    fn can_decrypt(&self, card: CardId) -> bool {
        algorithms::can_decrypt(&self.readiness_inputs(), card)
    }

    fn can_refresh(&self) -> bool {
        algorithms::can_refresh(&self.readiness_inputs())
    }

    fn snapshot(&self) -> ControllerSnapshot {
        let session = self.session.lock().current().map(SessionContext::info);
        let status = self.status.lock().clone();
        ControllerSnapshot {
            session,
            deployment: status.deployment,
            engine: self.engine.status(),
            operation: self.operations.lock().state(),
            registry: self.registry.snapshot(),
            last_error: status.last_error,
            message: status.message,
        }
    }

    fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }
}
