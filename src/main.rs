use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use prize_wheel::{
    spin_rng, FileStore, KeyValueStore, MemoryStore, PrizeWheel, Settings, WheelConfig,
};

#[derive(Parser, Debug)]
#[command(name = "prize-wheel")]
#[command(author, version, about = "Spin-the-wheel prize widget with a one-spin-per-visit gate")]
struct Args {
    /// Settings file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File holding the persisted lock flag
    #[arg(long)]
    state: Option<PathBuf>,

    /// Keep the lock in memory only; nothing survives a restart
    #[arg(long, conflicts_with = "state")]
    ephemeral: bool,

    /// Clear the lock before opening the wheel
    #[arg(long)]
    reset: bool,

    /// Seed for reproducible spins
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.verbose {
        "prize_wheel=debug"
    } else {
        "prize_wheel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse()?),
        )
        .init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_from_default_path().unwrap_or_default(),
    };
    let config = WheelConfig::from_settings(&settings);

    let store: Box<dyn KeyValueStore> = if args.ephemeral {
        info!("lock kept in memory for this session");
        Box::new(MemoryStore::new())
    } else {
        let path = args
            .state
            .clone()
            .or_else(|| settings.wheel.state_path.clone())
            .or_else(FileStore::default_path)
            .context("no data directory for the lock file; pass --state or --ephemeral")?;
        info!("lock file: {}", path.display());
        Box::new(FileStore::new(path))
    };

    let mut wheel = PrizeWheel::new(config, store, spin_rng(args.seed))?;
    if args.reset {
        info!("clearing spin lock");
        wheel.unlock();
    }
    wheel.show()?;

    Ok(())
}
