use std::collections::BTreeSet;

use uuid::Uuid;

use crate::errors::{Result, SnapshotError};
use crate::model::{ItemKind, Snapshot, SnapshotItem};
use crate::rules::hierarchy;

/// How [`remove_item`] treats leaves that would lose their path from the
/// start item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalMode {
    /// Refuse the removal with `ItemHasDependents`
    #[default]
    Strict,
    /// Caller accepts that the listed leaves become unreachable
    AcknowledgeDisconnect,
}

/// Add an item to a DRAFT snapshot
///
/// Generates a UUID v7 for the item, validates placement through the
/// hierarchy rules and appends the item after its existing siblings.
///
/// # Arguments
/// * `snapshot` - Snapshot to mutate
/// * `name` - Display name (must not be empty or whitespace-only)
/// * `parent_id` - Owning container, `None` for a top-level item
/// * `kind` - Container or leaf
/// * `learning_object_ref` - Delivered learning object (leaves only)
///
/// # Returns
/// The newly created item
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `InvalidName` - Name is empty
/// * `LearningObjectOnContainer` - Container given a learning-object ref
/// * `ItemNotFound` - Parent doesn't exist
/// * `InvalidParentKind` - Parent is a leaf
/// * `DepthExceeded` - Parent already sits at the maximum depth
pub fn add_item(
    snapshot: &mut Snapshot,
    name: String,
    parent_id: Option<&str>,
    kind: ItemKind,
    learning_object_ref: Option<String>,
) -> Result<SnapshotItem> {
    add_item_with_id(
        snapshot,
        Uuid::now_v7().to_string(),
        name,
        parent_id,
        kind,
        learning_object_ref,
    )
}

/// Same as [`add_item`] with a caller-chosen id
///
/// # Errors
/// As [`add_item`], plus `InvalidName` if `item_id` is empty or already used.
pub fn add_item_with_id(
    snapshot: &mut Snapshot,
    item_id: String,
    name: String,
    parent_id: Option<&str>,
    kind: ItemKind,
    learning_object_ref: Option<String>,
) -> Result<SnapshotItem> {
    snapshot.ensure_mutable()?;
    validate_name(&name)?;

    if item_id.trim().is_empty() || snapshot.contains_item(&item_id) {
        return Err(SnapshotError::InvalidName {
            reason: format!("item id '{}' is empty or already in use", item_id),
        });
    }

    let mut item = SnapshotItem::new(item_id, name, kind);
    item.parent_id = parent_id.map(str::to_string);
    item.learning_object_ref = learning_object_ref;

    let parent = match parent_id {
        Some(id) => Some(snapshot.get_item(id)?),
        None => None,
    };
    let depth = hierarchy::validate_insertion(&item, parent)?;
    item.depth = depth;
    item.position = next_position(snapshot, parent_id);

    tracing::debug!(
        snapshot_id = %snapshot.id(),
        item_id = %item.id,
        depth,
        kind = %kind,
        "item added"
    );

    snapshot.items.insert(item.id.clone(), item.clone());
    snapshot.touch();
    Ok(item)
}

/// Rename an item
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `InvalidName` - Name is empty
/// * `ItemNotFound` - Item doesn't exist
pub fn rename_item(snapshot: &mut Snapshot, item_id: &str, name: String) -> Result<()> {
    snapshot.ensure_mutable()?;
    validate_name(&name)?;
    snapshot.get_item_mut(item_id)?.name = name;
    snapshot.touch();
    Ok(())
}

/// Set or clear the learning object delivered by a leaf
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `ItemNotFound` - Item doesn't exist
/// * `LearningObjectOnContainer` - Item is a container and `learning_object_ref` is set
pub fn set_learning_object(
    snapshot: &mut Snapshot,
    item_id: &str,
    learning_object_ref: Option<String>,
) -> Result<()> {
    snapshot.ensure_mutable()?;
    let item = snapshot.get_item_mut(item_id)?;
    if item.is_container() && learning_object_ref.is_some() {
        return Err(SnapshotError::LearningObjectOnContainer {
            item_id: item_id.to_string(),
        });
    }
    item.learning_object_ref = learning_object_ref;
    snapshot.touch();
    Ok(())
}

/// Move an item (and its subtree) under a new parent
///
/// The item is appended after the new parent's existing children, and every
/// depth in the moved subtree is recomputed.
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `ItemNotFound` - Item or new parent doesn't exist
/// * `IllegalMove` - New parent is the item itself or one of its descendants
/// * `InvalidParentKind` - New parent is a leaf
/// * `DepthExceeded` - Some descendant would end up deeper than allowed
pub fn move_item(snapshot: &mut Snapshot, item_id: &str, new_parent_id: Option<&str>) -> Result<()> {
    snapshot.ensure_mutable()?;
    let old_depth = snapshot.get_item(item_id)?.depth;

    let subtree = snapshot.subtree_ids(item_id);
    if let Some(parent_id) = new_parent_id {
        if subtree.iter().any(|id| id == parent_id) {
            return Err(SnapshotError::IllegalMove {
                item_id: item_id.to_string(),
                reason: format!("{} lies inside the moved subtree", parent_id),
            });
        }
    }

    let new_parent = match new_parent_id {
        Some(id) => Some(snapshot.get_item(id)?),
        None => None,
    };
    let height = hierarchy::subtree_height(snapshot, item_id);
    let new_depth = hierarchy::validate_placement(new_parent, height)?;
    let position = next_position(snapshot, new_parent_id);

    for id in &subtree {
        let item = snapshot.get_item_mut(id)?;
        item.depth = item.depth - old_depth + new_depth;
    }
    let item = snapshot.get_item_mut(item_id)?;
    item.parent_id = new_parent_id.map(str::to_string);
    item.position = position;

    tracing::debug!(
        snapshot_id = %snapshot.id(),
        item_id,
        new_depth,
        moved = subtree.len(),
        "item moved"
    );

    snapshot.touch();
    Ok(())
}

/// Remove an item together with its descendant subtree
///
/// Every relation edge touching a removed item is dropped with it; a removal
/// never leaves dangling edges. If the start item is removed, the snapshot's
/// start designation is cleared.
///
/// # Returns
/// Ids of all removed items (pre-order, starting with `item_id`)
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `ItemNotFound` - Item doesn't exist
/// * `ItemHasDependents` - In [`RemovalMode::Strict`], some remaining leaf
///   reachable from the start item would become unreachable
pub fn remove_item(snapshot: &mut Snapshot, item_id: &str, mode: RemovalMode) -> Result<Vec<String>> {
    snapshot.ensure_mutable()?;
    snapshot.get_item(item_id)?;

    let removed = snapshot.subtree_ids(item_id);
    let removed_set: BTreeSet<&str> = removed.iter().map(String::as_str).collect();

    let mut graph = snapshot.relations.clone();
    for id in &removed {
        graph.remove_node(id);
    }

    if let Some(start) = snapshot.start_item_id() {
        let before = snapshot.relations.compute_reachable_set(start);
        let after = if removed_set.contains(start) {
            BTreeSet::new()
        } else {
            graph.compute_reachable_set(start)
        };
        let dependents: Vec<String> = before
            .into_iter()
            .filter(|id| !removed_set.contains(id.as_str()) && !after.contains(id))
            .filter(|id| snapshot.get_item(id).is_ok_and(SnapshotItem::is_leaf))
            .collect();

        if !dependents.is_empty() && mode == RemovalMode::Strict {
            return Err(SnapshotError::ItemHasDependents {
                item_id: item_id.to_string(),
                dependents,
            });
        }
    }

    for id in &removed {
        snapshot.items.remove(id);
    }
    snapshot.relations = graph;
    if snapshot
        .start_item_id()
        .is_some_and(|start| removed_set.contains(start))
    {
        snapshot.start_item_id = None;
    }

    tracing::debug!(
        snapshot_id = %snapshot.id(),
        item_id,
        removed = removed.len(),
        "item removed"
    );

    snapshot.touch();
    Ok(removed)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SnapshotError::InvalidName {
            reason: "Name cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

fn next_position(snapshot: &Snapshot, parent_id: Option<&str>) -> u32 {
    snapshot
        .children_of(parent_id)
        .last()
        .map_or(0, |last| last.position.saturating_add(1))
}
