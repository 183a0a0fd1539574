//! Snapline CLI
//!
//! Command-line interface for curriculum snapshots

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use snapline_core::logging_facility;
use snapline_engine::{EngineConfig, SnapshotLifecycleController};
use snapline_store::SqliteSnapshotRepository;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "snapline")]
#[command(about = "Snapline - Curriculum snapshot graph & lifecycle engine", long_about = None)]
struct Cli {
    /// Path to the SQLite store
    #[arg(long, global = true, default_value = ".snapline/store.db")]
    db: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Snapshot editing, lifecycle and inspection
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Seed import operations
    Seed(commands::seed::SeedArgs),
}

/// Everything a subcommand needs
pub struct Session {
    pub controller: SnapshotLifecycleController,
    pub repo: Arc<SqliteSnapshotRepository>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    logging_facility::init(config.log_profile);

    let repo = Arc::new(SqliteSnapshotRepository::open(
        &cli.db,
        config.lock_timeout(),
    )?);
    let session = Session {
        controller: SnapshotLifecycleController::new(repo.clone(), config),
        repo,
    };

    match cli.command {
        Commands::Snapshot(args) => commands::snapshot::execute(args, &session),
        Commands::Seed(args) => commands::seed::execute(args, &session),
    }
}
