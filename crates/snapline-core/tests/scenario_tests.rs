//! Snapshot lifecycle scenarios
//!
//! ## Scenarios Covered
//!
//! 1. Root container + leaf A as start item activates
//! 2. Unreachable leaf B blocks activation
//! 3. Reverse edge is rejected as a cycle
//! 4. Child under a depth-3 container is rejected
//! 5. Racing activations (see snapline-engine `concurrent_activation_tests`)
//! 6. Adding to an ACTIVE snapshot is rejected

mod common;

use common::{add, linear_course, new_draft, relate, start_at};
use snapline_core::{apply, Command, ItemKind, SnapshotError, SnapshotStatus};

fn activate() -> Command {
    Command::Activate {
        competing_active: None,
    }
}

#[test]
fn test_scenario_1_single_leaf_course_activates() {
    // GIVEN a snapshot with root container (depth 0) and leaf A (depth 1)
    let s = new_draft("program-1");
    let s = add(s, "root", None, ItemKind::Container);
    let s = add(s, "a", Some("root"), ItemKind::Leaf);
    assert_eq!(s.get_item("root").unwrap().depth, 0);
    assert_eq!(s.get_item("a").unwrap().depth, 1);

    // AND A is the start item
    let s = start_at(s, "a");

    // WHEN activated
    let s = apply(s, activate()).unwrap();

    // THEN the snapshot is ACTIVE
    assert_eq!(s.status(), SnapshotStatus::Active);
}

#[test]
fn test_scenario_2_unreachable_leaf_blocks_activation() {
    // GIVEN scenario 1 plus leaf B with no relation to A
    let s = new_draft("program-1");
    let s = add(s, "root", None, ItemKind::Container);
    let s = add(s, "a", Some("root"), ItemKind::Leaf);
    let s = add(s, "b", Some("root"), ItemKind::Leaf);
    let s = start_at(s, "a");

    // WHEN activated
    let result = apply(s, activate());

    // THEN activation fails naming B as unreachable
    assert_eq!(
        result.unwrap_err(),
        SnapshotError::UnreachableItems {
            start_item_id: "a".to_string(),
            item_ids: vec!["b".to_string()],
        }
    );
}

#[test]
fn test_scenario_3_reverse_edge_is_cycle() {
    // GIVEN leaves A and B with A -> B
    let s = new_draft("program-1");
    let s = add(s, "a", None, ItemKind::Leaf);
    let s = add(s, "b", None, ItemKind::Leaf);
    let s = relate(s, "a", "b");

    // WHEN B -> A is added
    let result = apply(
        s,
        Command::AddRelation {
            from_item_id: "b".to_string(),
            to_item_id: "a".to_string(),
        },
    );

    // THEN it fails with CycleDetected
    assert!(matches!(result, Err(SnapshotError::CycleDetected { .. })));
}

#[test]
fn test_scenario_4_child_under_depth_three_rejected() {
    // GIVEN containers nested down to depth 3
    let s = new_draft("program-1");
    let s = add(s, "d0", None, ItemKind::Container);
    let s = add(s, "d1", Some("d0"), ItemKind::Container);
    let s = add(s, "d2", Some("d1"), ItemKind::Container);
    let s = add(s, "d3", Some("d2"), ItemKind::Container);
    assert_eq!(s.get_item("d3").unwrap().depth, 3);

    // WHEN a child is added under the depth-3 container
    let result = apply(
        s,
        Command::AddItem {
            item_id: None,
            name: "Too deep".to_string(),
            parent_id: Some("d3".to_string()),
            kind: ItemKind::Leaf,
            learning_object_ref: None,
        },
    );

    // THEN it fails with DepthExceeded
    assert!(matches!(
        result,
        Err(SnapshotError::DepthExceeded {
            depth: 4,
            max_depth: 3,
            ..
        })
    ));
}

#[test]
fn test_scenario_6_add_item_on_active_snapshot_rejected() {
    // GIVEN an ACTIVE snapshot
    let s = apply(linear_course("program-1"), activate()).unwrap();

    // WHEN any structural mutation is attempted
    let add_item = apply(
        s.clone(),
        Command::AddItem {
            item_id: None,
            name: "Late".to_string(),
            parent_id: Some("root".to_string()),
            kind: ItemKind::Leaf,
            learning_object_ref: None,
        },
    );
    let add_relation = apply(
        s.clone(),
        Command::AddRelation {
            from_item_id: "a".to_string(),
            to_item_id: "c".to_string(),
        },
    );
    let remove_relation = apply(
        s.clone(),
        Command::RemoveRelation {
            from_item_id: "a".to_string(),
            to_item_id: "b".to_string(),
        },
    );
    let remove_item = apply(
        s.clone(),
        Command::RemoveItem {
            item_id: "c".to_string(),
            mode: snapline_core::RemovalMode::AcknowledgeDisconnect,
        },
    );

    // THEN each fails with ImmutableSnapshot
    for result in [add_item, add_relation, remove_relation, remove_item] {
        assert!(matches!(
            result,
            Err(SnapshotError::ImmutableSnapshot {
                status: SnapshotStatus::Active,
                ..
            })
        ));
    }

    // AND the frozen structure is untouched
    assert_eq!(s.relations().len(), 2);
    assert_eq!(s.item_count(), 4);
}

#[test]
fn test_full_lifecycle_draft_to_archived() {
    // GIVEN an activatable course
    let s = linear_course("program-1");

    // WHEN it runs through its whole lifecycle
    let s = apply(s, activate()).unwrap();
    let s = apply(s, Command::Complete).unwrap();
    let s = apply(s, Command::Archive).unwrap();

    // THEN it ends ARCHIVED and nothing leaves ARCHIVED
    assert_eq!(s.status(), SnapshotStatus::Archived);
    assert!(matches!(
        apply(s, Command::Archive),
        Err(SnapshotError::IllegalStateTransition { .. })
    ));
}

#[test]
fn test_disconnected_chains_valid_in_draft_only() {
    // GIVEN two chains a -> b and c -> d, start at a
    let s = new_draft("program-1");
    let s = add(s, "a", None, ItemKind::Leaf);
    let s = add(s, "b", None, ItemKind::Leaf);
    let s = add(s, "c", None, ItemKind::Leaf);
    let s = add(s, "d", None, ItemKind::Leaf);
    let s = relate(s, "a", "b");
    let s = relate(s, "c", "d");
    let s = start_at(s, "a");

    // THEN the draft is fine but activation lists c and d
    assert!(matches!(
        apply(s, activate()),
        Err(SnapshotError::UnreachableItems { item_ids, .. }) if item_ids == vec!["c", "d"]
    ));
}

#[test]
fn test_duplicate_predecessor_rejected() {
    // GIVEN a -> c
    let s = new_draft("program-1");
    let s = add(s, "a", None, ItemKind::Leaf);
    let s = add(s, "b", None, ItemKind::Leaf);
    let s = add(s, "c", None, ItemKind::Leaf);
    let s = relate(s, "a", "c");

    // WHEN b -> c is added
    let result = apply(
        s,
        Command::AddRelation {
            from_item_id: "b".to_string(),
            to_item_id: "c".to_string(),
        },
    );

    // THEN c keeps its single predecessor
    assert_eq!(
        result.unwrap_err(),
        SnapshotError::DuplicatePredecessor {
            item_id: "c".to_string(),
            existing_predecessor_id: "a".to_string(),
            rejected_predecessor_id: "b".to_string(),
        }
    );
}

#[test]
fn test_self_loop_rejected() {
    let s = add(new_draft("p"), "a", None, ItemKind::Leaf);
    let result = apply(
        s,
        Command::AddRelation {
            from_item_id: "a".to_string(),
            to_item_id: "a".to_string(),
        },
    );
    assert!(matches!(result, Err(SnapshotError::SelfLoop { .. })));
}
