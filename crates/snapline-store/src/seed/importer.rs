//! Seed importer orchestration
//!
//! Builds a DRAFT snapshot by feeding core commands through `apply()`, so
//! imported structures obey exactly the same rules as interactive edits,
//! then persists it with a single repository save. Activation is left to
//! the lifecycle controller.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use snapline_core::errors::ExError;
use snapline_core::model::Snapshot;
use snapline_core::repository::SnapshotRepository;
use snapline_core::{apply, Command};
use uuid::Uuid;

use crate::errors::{seed_validation, Result};
use crate::seed::format::SeedDocument;

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedImportReport {
    pub snapshot_id: String,
    pub program_id: String,
    pub version: u64,
    pub item_count: usize,
    pub relation_count: usize,
    /// Seed key -> generated item id
    pub item_ids: HashMap<String, String>,
    /// The document asked for activation after import
    pub activate_requested: bool,
    pub seed_digest: String,
}

/// SHA256 over the canonical JSON form of the seed document
pub fn compute_seed_digest(seed: &SeedDocument) -> Result<String> {
    let canonical = serde_json::to_string(seed).map_err(|e| {
        seed_validation(&format!("Failed to canonicalize seed: {}", e))
    })?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Import a parsed seed as a new DRAFT snapshot
///
/// # Errors
///
/// Structural violations from the core operations (depth, leaf endpoints,
/// cycles, predecessors) abort the import before anything is saved.
pub fn import_seed(repo: &dyn SnapshotRepository, seed: &SeedDocument) -> Result<SeedImportReport> {
    let seed_digest = compute_seed_digest(seed)?;

    let mut snapshot = Snapshot::create(seed.program.clone());
    let item_ids: HashMap<String, String> = seed
        .flatten()
        .into_iter()
        .map(|(_, item)| (item.key.clone(), Uuid::now_v7().to_string()))
        .collect();

    let mut commands = Vec::new();
    for (parent_key, item) in seed.flatten() {
        commands.push(Command::AddItem {
            item_id: Some(resolve(&item_ids, &item.key)?),
            name: item.name.clone(),
            parent_id: parent_key.map(|key| resolve(&item_ids, key)).transpose()?,
            kind: item.kind,
            learning_object_ref: item.learning_object.clone(),
        });
    }
    for relation in &seed.relations {
        commands.push(Command::AddRelation {
            from_item_id: resolve(&item_ids, &relation.from)?,
            to_item_id: resolve(&item_ids, &relation.to)?,
        });
    }
    if let Some(start) = &seed.start {
        commands.push(Command::SetStartItem {
            item_id: resolve(&item_ids, start)?,
        });
    }

    for cmd in commands {
        let op = cmd.op_name();
        snapshot = apply(snapshot, cmd).map_err(|e| ExError::from(e).with_op(op))?;
    }

    let version = repo.save(&snapshot)?;

    tracing::debug!(
        snapshot_id = snapshot.id(),
        program_id = snapshot.program_id(),
        items = snapshot.item_count(),
        "seed imported"
    );

    Ok(SeedImportReport {
        snapshot_id: snapshot.id().to_string(),
        program_id: snapshot.program_id().to_string(),
        version,
        item_count: snapshot.item_count(),
        relation_count: snapshot.relation_graph().len(),
        item_ids,
        activate_requested: seed.activate,
        seed_digest,
    })
}

fn resolve(item_ids: &HashMap<String, String>, key: &str) -> Result<String> {
    item_ids
        .get(key)
        .cloned()
        .ok_or_else(|| seed_validation(&format!("Unknown item key: {}", key)))
}
