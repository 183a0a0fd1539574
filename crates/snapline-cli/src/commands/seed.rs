//! Seed import command
//!
//! Usage: snapline seed import <PATH> [--activate]

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use snapline_core_types::RequestContext;
use snapline_engine::{apply_engine_command, EngineCommand};
use snapline_store::seed::parse_seed_file;

use crate::Session;

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[command(subcommand)]
    pub command: SeedCommand,
}

#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Import a seed file (or a directory of seeds) as DRAFT snapshots
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to seed YAML file or directory
    pub path: PathBuf,

    /// Request activation after import, regardless of the seed's `activate` flag
    #[arg(long)]
    pub activate: bool,
}

/// Execute seed command
pub fn execute(args: SeedArgs, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        SeedCommand::Import(import_args) => execute_import(import_args, session),
    }
}

fn execute_import(args: ImportArgs, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    if args.path.is_dir() {
        // Sorted for determinism
        let mut seed_files: Vec<PathBuf> = std::fs::read_dir(&args.path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        seed_files.sort();

        for seed_file in seed_files {
            import_one(&seed_file, args.activate, session)?;
        }
    } else {
        import_one(&args.path, args.activate, session)?;
    }

    Ok(())
}

fn import_one(path: &Path, activate: bool, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("Importing {}...", path.display());
    let seed = parse_seed_file(path)?;
    let report = session.controller.import_seed(&seed)?;
    println!(
        "Imported snapshot {} for program {} ({} items, {} relations, seed digest {})",
        report.snapshot_id,
        report.program_id,
        report.item_count,
        report.relation_count,
        report.seed_digest
    );

    if activate || report.activate_requested {
        apply_engine_command(
            &session.controller,
            &RequestContext::new(),
            EngineCommand::RequestActivation {
                snapshot_id: report.snapshot_id.clone(),
            },
        )?;
        println!("Activated snapshot {}", report.snapshot_id);
    }

    Ok(())
}
