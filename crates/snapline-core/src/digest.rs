//! Structure digest for snapshots.
//!
//! A SHA256 hash over a canonical JSON encoding of the frozen structure:
//! items (ordered by id), relations (ordered by endpoints) and the start
//! item. Status, version and timestamps are excluded, so the digest only
//! changes when the structure does.
//!
//! Recorded on activation; comparing it against a recomputation after
//! reload proves the structure survived persistence unchanged.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::model::{Snapshot, SnapshotItem, SnapshotRelation};

#[derive(Serialize)]
struct CanonicalStructure<'a> {
    start_item_id: Option<&'a str>,
    items: Vec<&'a SnapshotItem>,
    relations: Vec<SnapshotRelation>,
}

/// Compute the hex-encoded SHA256 structure digest (64 characters)
///
/// ## Errors
///
/// Returns `SnapshotError::Serialization` if JSON serialization fails.
pub fn compute_structure_digest(snapshot: &Snapshot) -> Result<String> {
    let canonical = CanonicalStructure {
        start_item_id: snapshot.start_item_id(),
        items: snapshot.items().collect(),
        relations: snapshot.relations(),
    };
    let json = serde_json::to_string(&canonical)?;
    Ok(hash_string(&json))
}

/// Whether the recorded digest (if any) still matches the structure
///
/// ## Errors
///
/// Returns `SnapshotError::Serialization` if JSON serialization fails.
pub fn verify_structure_digest(snapshot: &Snapshot) -> Result<bool> {
    match snapshot.structure_digest() {
        Some(recorded) => Ok(compute_structure_digest(snapshot)? == recorded),
        None => Ok(true),
    }
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
