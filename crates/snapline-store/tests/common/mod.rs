use snapline_core::{apply, Command, ItemKind, Snapshot};

#[allow(dead_code)]
pub fn add(snapshot: Snapshot, id: &str, parent: Option<&str>, kind: ItemKind) -> Snapshot {
    apply(
        snapshot,
        Command::AddItem {
            item_id: Some(id.to_string()),
            name: id.to_uppercase(),
            parent_id: parent.map(str::to_string),
            kind,
            learning_object_ref: None,
        },
    )
    .unwrap()
}

/// Root container with leaves `a -> b -> c`, started at `a`
#[allow(dead_code)]
pub fn linear_course(program: &str) -> Snapshot {
    let s = Snapshot::create(program);
    let s = add(s, "root", None, ItemKind::Container);
    let s = add(s, "a", Some("root"), ItemKind::Leaf);
    let s = add(s, "b", Some("root"), ItemKind::Leaf);
    let s = add(s, "c", Some("root"), ItemKind::Leaf);
    let s = apply(
        s,
        Command::AddRelation {
            from_item_id: "a".to_string(),
            to_item_id: "b".to_string(),
        },
    )
    .unwrap();
    let s = apply(
        s,
        Command::AddRelation {
            from_item_id: "b".to_string(),
            to_item_id: "c".to_string(),
        },
    )
    .unwrap();
    apply(
        s,
        Command::SetStartItem {
            item_id: "a".to_string(),
        },
    )
    .unwrap()
}

/// Activate without a competing snapshot
#[allow(dead_code)]
pub fn activated(snapshot: Snapshot) -> Snapshot {
    apply(
        snapshot,
        Command::Activate {
            competing_active: None,
        },
    )
    .unwrap()
}
