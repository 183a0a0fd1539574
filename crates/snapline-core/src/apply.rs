//! Functional-boundary apply function
//!
//! `apply()` is the canonical entry point for snapshot mutations.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: either the command succeeds and a valid new snapshot
//!   is returned, or it fails with a typed error
//! - **No panics**: invalid input returns typed errors
//! - **Re-validated**: structural commands re-run the structure checks before
//!   the new snapshot is handed back
//!
//! Callers that need the old snapshot after a failure clone it before
//! calling; the engine always does.
//!
//! ## Example
//!
//! ```
//! use snapline_core::{apply::apply, Command, ItemKind, Snapshot};
//!
//! let snapshot = Snapshot::create("program-1");
//! let cmd = Command::AddItem {
//!     item_id: Some("intro".to_string()),
//!     name: "Introduction".to_string(),
//!     parent_id: None,
//!     kind: ItemKind::Leaf,
//!     learning_object_ref: None,
//! };
//!
//! let snapshot = apply(snapshot, cmd).unwrap();
//! assert_eq!(snapshot.item_count(), 1);
//! ```

use crate::commands::Command;
use crate::errors::Result;
use crate::model::Snapshot;
use crate::ops::{item_ops, lifecycle_ops, relation_ops};
use crate::rules::validation;

/// Apply a command to a snapshot, returning the new snapshot state
///
/// # Errors
///
/// Any error of the operation the command maps to; see the functions in
/// [`crate::ops`] for the per-operation taxonomy.
pub fn apply(mut snapshot: Snapshot, cmd: Command) -> Result<Snapshot> {
    let structural = cmd.is_structural();

    match cmd {
        Command::AddItem {
            item_id,
            name,
            parent_id,
            kind,
            learning_object_ref,
        } => {
            match item_id {
                Some(id) => item_ops::add_item_with_id(
                    &mut snapshot,
                    id,
                    name,
                    parent_id.as_deref(),
                    kind,
                    learning_object_ref,
                )?,
                None => item_ops::add_item(
                    &mut snapshot,
                    name,
                    parent_id.as_deref(),
                    kind,
                    learning_object_ref,
                )?,
            };
        }

        Command::RenameItem { item_id, name } => {
            item_ops::rename_item(&mut snapshot, &item_id, name)?;
        }

        Command::SetLearningObject {
            item_id,
            learning_object_ref,
        } => {
            item_ops::set_learning_object(&mut snapshot, &item_id, learning_object_ref)?;
        }

        Command::MoveItem {
            item_id,
            new_parent_id,
        } => {
            item_ops::move_item(&mut snapshot, &item_id, new_parent_id.as_deref())?;
        }

        Command::RemoveItem { item_id, mode } => {
            item_ops::remove_item(&mut snapshot, &item_id, mode)?;
        }

        Command::AddRelation {
            from_item_id,
            to_item_id,
        } => {
            relation_ops::add_relation(&mut snapshot, &from_item_id, &to_item_id)?;
        }

        Command::RemoveRelation {
            from_item_id,
            to_item_id,
        } => {
            relation_ops::remove_relation(&mut snapshot, &from_item_id, &to_item_id)?;
        }

        Command::SetStartItem { item_id } => {
            relation_ops::set_start_item(&mut snapshot, &item_id)?;
        }

        Command::Activate { competing_active } => {
            lifecycle_ops::activate(&mut snapshot, competing_active.as_deref())?;
        }

        Command::Complete => lifecycle_ops::complete(&mut snapshot)?,

        Command::Archive => lifecycle_ops::archive(&mut snapshot)?,
    }

    if structural {
        validation::validate_structure(&snapshot)?;
    }

    Ok(snapshot)
}
