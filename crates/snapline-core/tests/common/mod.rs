use snapline_core::{apply, Command, ItemKind, Snapshot};

/// Create a new empty DRAFT snapshot for `program`
#[allow(dead_code)]
pub fn new_draft(program: &str) -> Snapshot {
    Snapshot::create(program)
}

/// Add an item with a fixed id through the command boundary
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

#[allow(dead_code)]
pub fn relate(snapshot: Snapshot, from: &str, to: &str) -> Snapshot {
    apply(
        snapshot,
        Command::AddRelation {
            from_item_id: from.to_string(),
            to_item_id: to.to_string(),
        },
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn start_at(snapshot: Snapshot, item_id: &str) -> Snapshot {
    apply(
        snapshot,
        Command::SetStartItem {
            item_id: item_id.to_string(),
        },
    )
    .unwrap()
}

/// Root container with leaves `a -> b -> c`, started at `a`
#[allow(dead_code)]
pub fn linear_course(program: &str) -> Snapshot {
    let s = new_draft(program);
    let s = add(s, "root", None, ItemKind::Container);
    let s = add(s, "a", Some("root"), ItemKind::Leaf);
    let s = add(s, "b", Some("root"), ItemKind::Leaf);
    let s = add(s, "c", Some("root"), ItemKind::Leaf);
    let s = relate(s, "a", "b");
    let s = relate(s, "b", "c");
    start_at(s, "a")
}
