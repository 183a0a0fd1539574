use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::item::SnapshotItem;
use super::relation::SnapshotRelation;
use super::status::SnapshotStatus;
use crate::errors::{Result, SnapshotError};
use crate::graph::RelationGraph;
use crate::rules::validation;

/// Snapshot - aggregate root for one version of a program's curriculum
///
/// Owns the item tree, the relation layer and the lifecycle status. All
/// structural mutation goes through `crate::ops`, which enforce the
/// invariants; fields are therefore only readable from outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub(crate) id: String,
    pub(crate) program_id: String,
    pub(crate) status: SnapshotStatus,
    pub(crate) start_item_id: Option<String>,
    pub(crate) items: BTreeMap<String, SnapshotItem>,
    pub(crate) relations: RelationGraph,
    /// Optimistic-lock version; 0 until first persisted
    pub(crate) version: u64,
    /// Structure digest recorded when the snapshot was activated
    pub(crate) structure_digest: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) activated_at: Option<DateTime<Utc>>,
}

/// Persisted representation of a snapshot, used by repository adapters
/// to rebuild the aggregate
#[derive(Debug, Clone)]
pub struct SnapshotParts {
    pub id: String,
    pub program_id: String,
    pub status: SnapshotStatus,
    pub start_item_id: Option<String>,
    pub items: Vec<SnapshotItem>,
    pub relations: Vec<SnapshotRelation>,
    pub version: u64,
    pub structure_digest: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Create a new, empty DRAFT snapshot with the given id
    pub fn new(id: String, program_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            program_id,
            status: SnapshotStatus::Draft,
            start_item_id: None,
            items: BTreeMap::new(),
            relations: RelationGraph::new(),
            version: 0,
            structure_digest: None,
            created_at: now,
            updated_at: now,
            activated_at: None,
        }
    }

    /// Create a new DRAFT snapshot with a generated UUID v7 id
    pub fn create(program_id: impl Into<String>) -> Self {
        Self::new(Uuid::now_v7().to_string(), program_id.into())
    }

    /// Rebuild an aggregate from persisted parts, re-validating structure
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found (dangling relation,
    /// depth mismatch, cycle, ...). Corrupt rows never become a live aggregate.
    pub fn from_parts(parts: SnapshotParts) -> Result<Self> {
        let items: BTreeMap<String, SnapshotItem> = parts
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let relations = RelationGraph::from_edges(parts.relations)?;

        let snapshot = Self {
            id: parts.id,
            program_id: parts.program_id,
            status: parts.status,
            start_item_id: parts.start_item_id,
            items,
            relations,
            version: parts.version,
            structure_digest: parts.structure_digest,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            activated_at: parts.activated_at,
        };
        validation::validate_structure(&snapshot)?;
        Ok(snapshot)
    }

    /// Decompose into persisted parts (items ordered by id)
    pub fn to_parts(&self) -> SnapshotParts {
        SnapshotParts {
            id: self.id.clone(),
            program_id: self.program_id.clone(),
            status: self.status,
            start_item_id: self.start_item_id.clone(),
            items: self.items.values().cloned().collect(),
            relations: self.relations.edges(),
            version: self.version,
            structure_digest: self.structure_digest.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            activated_at: self.activated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    pub fn status(&self) -> SnapshotStatus {
        self.status
    }

    pub fn start_item_id(&self) -> Option<&str> {
        self.start_item_id.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn structure_digest(&self) -> Option<&str> {
        self.structure_digest.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    /// Record the version assigned by a successful save
    pub fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }

    /// Get an item by id
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if no such item exists in this snapshot.
    pub fn get_item(&self, item_id: &str) -> Result<&SnapshotItem> {
        self.items
            .get(item_id)
            .ok_or_else(|| SnapshotError::ItemNotFound {
                item_id: item_id.to_string(),
            })
    }

    pub(crate) fn get_item_mut(&mut self, item_id: &str) -> Result<&mut SnapshotItem> {
        self.items
            .get_mut(item_id)
            .ok_or_else(|| SnapshotError::ItemNotFound {
                item_id: item_id.to_string(),
            })
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    /// All items, ordered by id
    pub fn items(&self) -> impl Iterator<Item = &SnapshotItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Ids of every leaf item, ordered by id
    pub fn leaf_ids(&self) -> Vec<String> {
        self.items
            .values()
            .filter(|item| item.is_leaf())
            .map(|item| item.id.clone())
            .collect()
    }

    /// Direct children of `parent_id` (top-level items for `None`),
    /// in position order
    pub fn children_of(&self, parent_id: Option<&str>) -> Vec<&SnapshotItem> {
        let mut children: Vec<&SnapshotItem> = self
            .items
            .values()
            .filter(|item| item.parent_id.as_deref() == parent_id)
            .collect();
        children.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        children
    }

    /// Ids of `item_id` and all of its descendants (pre-order)
    pub fn subtree_ids(&self, item_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![item_id.to_string()];
        while let Some(current) = stack.pop() {
            for child in self.children_of(Some(&current)).into_iter().rev() {
                stack.push(child.id.clone());
            }
            out.push(current);
        }
        out
    }

    pub fn relation_graph(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn relations(&self) -> Vec<SnapshotRelation> {
        self.relations.edges()
    }

    /// Fail unless items and relations may be changed
    ///
    /// # Errors
    ///
    /// Returns `ImmutableSnapshot` for any non-DRAFT status.
    pub fn ensure_mutable(&self) -> Result<()> {
        if self.status.is_structurally_mutable() {
            Ok(())
        } else {
            Err(SnapshotError::ImmutableSnapshot {
                snapshot_id: self.id.clone(),
                status: self.status,
            })
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
