//! Large preimage uploader
//!
//! Prepares a preimage for the oracle's large preimage flow and runs it
//! through a recording sender, showing:
//! - The init, AddLeaves and squeeze transactions that would be sent
//! - Resumption from a persisted claim registry
//! - Independent verification of the finalization proof
//!
//! Run with: cargo run --release -- --file <preimage>
//! For a synthetic preimage: cargo run --release -- --random 100000

use alloy_primitives::Address;
use clap::{ArgAction, Parser};
use large_preimage::{
    api::{PreimageOracleData, UploadCoordinator, UploadOutcome},
    config, keccak_preimage_key, AbiOracleBinding, ClaimRegistry, LargePreimageError,
    RecordingSender, Result, UploadConfig,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for the uploader
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Preimage file to upload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Size of a seeded random preimage, used when no file is given
    #[arg(long, default_value_t = 1000)]
    random: usize,

    /// Account that owns the claim
    #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
    claimant: Address,

    /// Preimage oracle address (overrides the config file)
    #[arg(long)]
    oracle: Option<Address>,

    /// Part offset the claim exposes once finalized
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// JSON upload config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ceiling on blocks per AddLeaves call (overrides the config file)
    #[arg(long)]
    max_blocks_per_batch: Option<usize>,

    /// Claim registry to resume from and save to
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Print every transaction as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Increase output verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Phase 1: Configuration
    info!("[1/3] Setup");
    let config = load_config(cli)?;
    let data = load_preimage(cli)?;
    let registry = match &cli.registry {
        Some(path) if path.exists() => ClaimRegistry::load(path)?,
        _ => ClaimRegistry::new(),
    };
    info!(
        "  ✓ Preimage: {} bytes, key {}",
        data.data.len(),
        keccak_preimage_key(&data.data)
    );
    info!(
        "  ✓ Oracle {} (rate {}, {} blocks per batch)",
        config.oracle, config.rate, config.max_blocks_per_batch
    );
    if !registry.is_empty() {
        info!("  ✓ Registry: {} known claims", registry.len());
    }
    info!("");

    // Phase 2: Upload
    info!("[2/3] Upload");
    let sender = RecordingSender::new(cli.claimant);
    let oracle = AbiOracleBinding::new(config.oracle, config.rate);
    let mut coordinator =
        UploadCoordinator::new(config.clone(), oracle, &sender)?.with_registry(registry);
    let outcome = coordinator.upload_preimage(0, &data)?;
    display_transactions(&outcome, cli.json)?;
    info!("");

    // Phase 3: Verification
    info!("[3/3] Verification");
    outcome.proof.verify(config.odd_node)?;
    info!(
        "  ✓ Proof of block {} verifies against root {}",
        outcome.proof.target.leaf.index, outcome.proof.root
    );
    info!("");
    info!("{}", outcome.metrics.format_table());

    if let Some(path) = &cli.registry {
        coordinator.registry().save(path)?;
        info!("  ✓ Registry saved to {}", path.display());
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<UploadConfig> {
    let mut config = match &cli.config {
        Some(path) => UploadConfig::load(path)?,
        None => UploadConfig::default(),
    };
    if let Some(oracle) = cli.oracle {
        config.oracle = oracle;
    }
    if let Some(max_blocks) = cli.max_blocks_per_batch {
        config.max_blocks_per_batch = max_blocks;
    }
    config.validate()?;
    Ok(config)
}

fn load_preimage(cli: &Cli) -> Result<PreimageOracleData> {
    let bytes = match &cli.file {
        Some(path) => std::fs::read(path).map_err(|e| {
            LargePreimageError::IO(format!("Failed to read {}: {}", path.display(), e))
        })?,
        None => {
            let mut rng = StdRng::seed_from_u64(config::TEST_RANDOM_SEED);
            let mut bytes = vec![0u8; cli.random];
            rng.fill_bytes(&mut bytes);
            bytes
        }
    };
    Ok(PreimageOracleData::new(bytes, cli.offset))
}

fn display_transactions(outcome: &UploadOutcome, json: bool) -> Result<()> {
    info!(
        "  Claim {} (uuid {})",
        outcome.claim_index, outcome.claim.uuid
    );
    if outcome.transactions.is_empty() {
        info!("  • Claim already finalized, nothing sent");
    }
    for (i, tx) in outcome.transactions.iter().enumerate() {
        info!(
            "  • #{:<3} {:<14} {:>8} bytes calldata",
            i,
            tx.method(),
            tx.calldata().len()
        );
    }

    if json {
        let rendered = serde_json::to_string_pretty(&outcome.transactions).map_err(|e| {
            LargePreimageError::Serialization(format!("Failed to render transactions: {}", e))
        })?;
        println!("{}", rendered);
    }
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info,large_preimage=info",
        1 => "debug,large_preimage=debug",
        _ => "large_preimage=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    use tracing_tree::HierarchicalLayer;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            HierarchicalLayer::new(2)
                .with_targets(false)
                .with_bracketed_fields(true),
        )
        .init();
}
