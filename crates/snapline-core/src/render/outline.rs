use std::fmt::Write;

use crate::model::{Snapshot, SnapshotItem};

/// Render a snapshot as a Markdown outline
///
/// Generates:
/// - Header with program, status and start item
/// - The item tree as a nested bullet list in position order, each line
///   showing kind, depth and learning-object ref
/// - The relation list, ordered by endpoints
pub fn render_outline(snapshot: &Snapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Snapshot {}\n", snapshot.id());
    let _ = writeln!(output, "**Program**: {}\n", snapshot.program_id());
    let _ = writeln!(output, "**Status**: {}\n", snapshot.status());
    if let Some(start) = snapshot.start_item_id() {
        let _ = writeln!(output, "**Start**: {}\n", start);
    }
    if let Some(digest) = snapshot.structure_digest() {
        let _ = writeln!(output, "**Digest**: `{}`\n", digest);
    }

    output.push_str("## Items\n\n");
    if snapshot.item_count() == 0 {
        output.push_str("_(empty)_\n");
    }
    for root in snapshot.children_of(None) {
        render_item(snapshot, root, &mut output);
    }

    let relations = snapshot.relations();
    if !relations.is_empty() {
        output.push_str("\n## Relations\n\n");
        for edge in relations {
            let _ = writeln!(output, "- {} -> {}", edge.from_item_id, edge.to_item_id);
        }
    }

    output
}

fn render_item(snapshot: &Snapshot, item: &SnapshotItem, output: &mut String) {
    let indent = "  ".repeat(usize::from(item.depth));
    let _ = write!(
        output,
        "{}- {} `{}` ({}, depth {})",
        indent, item.name, item.id, item.kind, item.depth
    );
    if let Some(lo) = &item.learning_object_ref {
        let _ = write!(output, " -> {}", lo);
    }
    if snapshot.start_item_id() == Some(item.id.as_str()) {
        output.push_str(" [start]");
    }
    output.push('\n');

    for child in snapshot.children_of(Some(&item.id)) {
        render_item(snapshot, child, output);
    }
}
