//! Fernveil console application.
//!
//! A line-oriented interface for finding spirits, completing their tasks and
//! keeping a journal of encounters:
//!
//! ```bash
//! cargo run -p fernveil -- --data-dir ~/.fernveil
//! ```

mod config;
mod console;

use config::{ConsoleConfig, DATA_DIR_ENV};
use console::Console;
use fernveil_core::{Catalog, FileStorage, ProgressionStore, StoreConfig, SystemClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with protocol lines
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = ConsoleConfig::from_args(&args, std::env::var(DATA_DIR_ENV).ok());

    if config.show_help {
        print_help();
        return Ok(());
    }

    info!(data_dir = %config.data_dir.display(), seed = ?config.seed, "Starting Fernveil");

    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let store = ProgressionStore::open(storage, StoreConfig::default()).await;

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut console = Console::new(
        store,
        Catalog::reference(),
        rng,
        Arc::new(SystemClock),
        io::stdout(),
    );
    console.run(io::stdin().lock()).await?;

    Ok(())
}

fn print_help() {
    println!("Fernveil - find spirits, complete their tasks, grow your bond");
    println!();
    println!("Usage: fernveil [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --data-dir <path>  Where progress is stored (default: .fernveil)");
    println!("  --seed <n>         Seed spirit scans for a repeatable session");
    println!("  -h, --help         Show this help");
    println!();
    println!("Environment:");
    println!("  {DATA_DIR_ENV}  Default for --data-dir");
    println!("  RUST_LOG           Log filter, e.g. fernveil_core=debug (logs go to stderr)");
}
