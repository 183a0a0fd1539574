//! Property tests for the structural invariants
//!
//! Random command sequences are pushed through `apply()`; rejected commands
//! are ignored. Whatever survives must satisfy the depth, acyclicity and
//! activation-iff properties.

use std::collections::BTreeSet;

use proptest::prelude::*;
use snapline_core::rules::MAX_DEPTH;
use snapline_core::{apply, Command, ItemKind, Snapshot, SnapshotStatus};

#[derive(Debug, Clone)]
enum Op {
    Add { parent: Option<usize>, leaf: bool },
    Relate { from: usize, to: usize },
    Unrelate { from: usize, to: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (proptest::option::of(0usize..16), any::<bool>())
            .prop_map(|(parent, leaf)| Op::Add { parent, leaf }),
        (0usize..16, 0usize..16).prop_map(|(from, to)| Op::Relate { from, to }),
        (0usize..16, 0usize..16).prop_map(|(from, to)| Op::Unrelate { from, to }),
    ]
}

fn id(n: usize) -> String {
    format!("item-{:02}", n)
}

/// Apply ops, keeping the last good snapshot after every rejection
fn run(ops: &[Op]) -> Snapshot {
    let mut snapshot = Snapshot::create("prop");
    let mut next = 0usize;
    for op in ops {
        let cmd = match op {
            Op::Add { parent, leaf } => {
                let cmd = Command::AddItem {
                    item_id: Some(id(next)),
                    name: id(next),
                    parent_id: parent.map(id),
                    kind: if *leaf { ItemKind::Leaf } else { ItemKind::Container },
                    learning_object_ref: None,
                };
                next += 1;
                cmd
            }
            Op::Relate { from, to } => Command::AddRelation {
                from_item_id: id(*from),
                to_item_id: id(*to),
            },
            Op::Unrelate { from, to } => Command::RemoveRelation {
                from_item_id: id(*from),
                to_item_id: id(*to),
            },
        };
        if let Ok(updated) = apply(snapshot.clone(), cmd) {
            snapshot = updated;
        }
    }
    snapshot
}

proptest! {
    #[test]
    fn prop_depth_is_parent_plus_one_and_bounded(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let snapshot = run(&ops);
        for item in snapshot.items() {
            prop_assert!(item.depth <= MAX_DEPTH);
            match &item.parent_id {
                None => prop_assert_eq!(item.depth, 0),
                Some(parent_id) => {
                    let parent = snapshot.get_item(parent_id).unwrap();
                    prop_assert!(parent.is_container());
                    prop_assert_eq!(item.depth, parent.depth + 1);
                }
            }
        }
    }

    #[test]
    fn prop_accepted_edges_stay_acyclic(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let snapshot = run(&ops);
        let graph = snapshot.relation_graph();
        prop_assert!(!graph.has_cycle());

        let mut targets = BTreeSet::new();
        for edge in snapshot.relations() {
            // single predecessor per node
            prop_assert!(targets.insert(edge.to_item_id.clone()));
            prop_assert!(snapshot.get_item(&edge.from_item_id).unwrap().is_leaf());
            prop_assert!(snapshot.get_item(&edge.to_item_id).unwrap().is_leaf());
        }
    }

    #[test]
    fn prop_activation_iff_start_reaches_every_leaf(
        ops in proptest::collection::vec(op_strategy(), 0..40),
        start in 0usize..16,
    ) {
        let snapshot = run(&ops);
        let start_id = id(start);

        let with_start = apply(snapshot.clone(), Command::SetStartItem { item_id: start_id.clone() });
        let Ok(with_start) = with_start else {
            // Not a leaf, missing, or has a predecessor: never activatable from here
            return Ok(());
        };

        let reachable = with_start.relation_graph().compute_reachable_set(&start_id);
        let leaves: BTreeSet<String> = with_start.leaf_ids().into_iter().collect();
        let expected = reachable == leaves;

        let activated = apply(with_start, Command::Activate { competing_active: None });
        prop_assert_eq!(activated.is_ok(), expected);
        if let Ok(active) = activated {
            prop_assert_eq!(active.status(), SnapshotStatus::Active);
        }
    }
}
