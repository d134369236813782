//! # Local Stack Fixture
//!
//! One controller wired to the in-process wallet, card program and engine
//! runtime, with handles to every knob a scenario needs.

use cf_01_encryption_engine::{
    DevCiphertextStore, EngineRuntimes, LocalFheRuntime, LocalRuntimeControls,
};
use cf_04_card_operations::{
    AddressBook, CardOperationController, CardOperationsApi, FusionConfig, LocalCardProgram,
    LocalWallet,
};
use shared_bus::InMemoryEventBus;
use shared_types::{Address, CardId, CardStats, ManualClock, HARDHAT_CHAIN_ID};
use std::sync::Arc;

/// Program address used by every scenario.
pub const PROGRAM: Address = [0xCF; 20];

/// Fixed start time (unix seconds).
pub const GENESIS: u64 = 1_700_000_000;

/// Seconds per day.
pub const DAY: u64 = 86_400;

/// Controller plus its collaborators.
pub struct LocalStack {
    /// Controller under test.
    pub controller: CardOperationController,
    /// Wallet the controller signs with.
    pub wallet: Arc<LocalWallet>,
    /// Ledger program.
    pub program: Arc<LocalCardProgram>,
    /// Ciphertext store shared by runtime and program.
    pub store: Arc<DevCiphertextStore>,
    /// Engine runtime knobs.
    pub runtime: Arc<LocalRuntimeControls>,
    /// Time source for authorizations.
    pub clock: Arc<ManualClock>,
    /// Event bus.
    pub bus: Arc<InMemoryEventBus>,
}

impl LocalStack {
    /// Stack on the hardhat chain with the program deployed there only.
    pub fn new() -> Self {
        Self::with_config(FusionConfig::for_testing())
    }

    /// Stack with a custom configuration.
    pub fn with_config(config: FusionConfig) -> Self {
        let store = Arc::new(DevCiphertextStore::new());
        let runtime = Arc::new(LocalFheRuntime::new(store.clone()));
        let controls = runtime.controls();
        let program = Arc::new(LocalCardProgram::new(
            PROGRAM,
            config.attribute_max,
            store.clone(),
        ));
        let wallet = Arc::new(LocalWallet::generate(HARDHAT_CHAIN_ID));
        let clock = Arc::new(ManualClock::new(GENESIS));
        let bus = Arc::new(InMemoryEventBus::new());
        let resolver = Arc::new(AddressBook::new().with_entry(HARDHAT_CHAIN_ID, PROGRAM));

        let controller = CardOperationController::new(
            config,
            wallet.clone(),
            resolver,
            program.clone(),
            EngineRuntimes::local_only(runtime),
            clock.clone(),
            bus.clone(),
        );

        Self {
            controller,
            wallet,
            program,
            store,
            runtime: controls,
            clock,
            bus,
        }
    }

    /// Stack with an open session.
    pub async fn connected() -> Self {
        let stack = Self::new();
        stack
            .controller
            .connect()
            .await
            .expect("local stack connects");
        stack
    }

    /// Mint and return the new card.
    pub async fn mint(&self, attack: u64, defense: u64, rarity: u64, special_power: u64) -> CardId {
        self.controller
            .mint(CardStats::new(attack, defense, rarity, special_power))
            .await
            .expect("mint succeeds")
    }

    /// Plaintext behind each of `card`'s handles, read from the store.
    pub fn ledger_values(&self, card: CardId) -> [u64; 4] {
        let snapshot = self.controller.snapshot();
        let attributes = snapshot
            .registry
            .cards
            .get(&card)
            .expect("card is owned");
        attributes.handles().handles().map(|(_, handle)| {
            self.store
                .plaintext(&handle)
                .expect("handle is known")
                .0
        })
    }
}

impl Default for LocalStack {
    fn default() -> Self {
        Self::new()
    }
}
