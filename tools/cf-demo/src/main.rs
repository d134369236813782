//! CF-Demo: card fusion walkthrough
//!
//! Wires the controller to the local wallet, card program and engine
//! runtime, then runs connect, mint, reveal, mint and fuse in order.
//! Prints the final controller snapshot and the Prometheus metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use cf_01_encryption_engine::{DevCiphertextStore, EngineRuntimes, LocalFheRuntime};
use cf_04_card_operations::{
    AddressBook, CardOperationController, CardOperationsApi, DeploymentResolver, FusionConfig,
    LocalCardProgram, LocalWallet,
};
use fusion_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_bus::{EventFilter, InMemoryEventBus};
use shared_types::{CardStats, ChainId, SystemClock, HARDHAT_CHAIN_ID};

/// Program address used when no address book is given.
const DEV_PROGRAM: [u8; 20] = [0xCF; 20];

/// CF-Demo: card fusion walkthrough
#[derive(Parser, Debug)]
#[command(name = "cf-demo")]
#[command(about = "Mint, reveal and fuse encrypted cards on a local stack")]
struct Args {
    /// JSON config file (defaults plus CF_* environment overrides otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deployment address book, keyed by chain id
    #[arg(short, long)]
    addresses: Option<PathBuf>,

    /// Chain the wallet starts on
    #[arg(long, default_value_t = HARDHAT_CHAIN_ID)]
    chain: ChainId,

    /// Attributes of the first card (attack,defense,rarity,special)
    #[arg(long, default_value = "50,50,10,20", value_parser = parse_stats)]
    first: CardStats,

    /// Attributes of the second card
    #[arg(long, default_value = "60,20,10,5", value_parser = parse_stats)]
    second: CardStats,

    /// Print the event log as JSON lines
    #[arg(long)]
    events: bool,
}

fn parse_stats(raw: &str) -> Result<CardStats, String> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<u64>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [attack, defense, rarity, special] => {
            Ok(CardStats::new(*attack, *defense, *rarity, *special))
        }
        _ => Err(format!("expected 4 comma-separated values, got {}", values.len())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("cf-demo"))?;

    let config = match &args.config {
        Some(path) => FusionConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FusionConfig::from_env(),
    };
    config.validate()?;

    let book = match &args.addresses {
        Some(path) => AddressBook::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AddressBook::new().with_entry(HARDHAT_CHAIN_ID, DEV_PROGRAM),
    };
    let program_address = book
        .resolve(args.chain)
        .await
        .map_or(DEV_PROGRAM, |info| info.address);

    let store = Arc::new(DevCiphertextStore::new());
    let runtime = Arc::new(LocalFheRuntime::new(store.clone()));
    let program = Arc::new(LocalCardProgram::new(
        program_address,
        config.attribute_max,
        store,
    ));
    let wallet = Arc::new(LocalWallet::generate(args.chain));
    let bus = Arc::new(InMemoryEventBus::new());
    let mut events = bus.subscribe(EventFilter::all());

    let controller = CardOperationController::new(
        config,
        wallet,
        Arc::new(book),
        program,
        EngineRuntimes::local_only(runtime),
        Arc::new(SystemClock),
        bus,
    );

    let session = controller.connect().await.context("connect")?;
    info!(chain_id = session.chain_id, "session open");

    let first = controller.mint(args.first).await.context("first mint")?;
    let revealed = controller
        .decrypt_attributes(first)
        .await
        .context("reveal")?;
    info!(card = %first, ?revealed, "first card revealed");

    let second = controller.mint(args.second).await.context("second mint")?;
    let child = controller.fuse(first, second).await.context("fuse")?;
    let stats = controller
        .decrypt_attributes(child)
        .await
        .context("reveal fused card")?;
    info!(card = %child, ?stats, "fused card revealed");

    if !controller.snapshot().operation.is_idle() {
        bail!("controller still busy after the walkthrough");
    }

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    if args.events {
        for event in events.drain() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    print!("{}", encode_metrics()?);
    Ok(())
}
