use snapline_core::{Command, ItemKind, Snapshot};
use snapline_engine::SnapshotLifecycleController;

#[allow(dead_code)]
pub fn add_item(
    controller: &SnapshotLifecycleController,
    snapshot_id: &str,
    id: &str,
    parent: Option<&str>,
    kind: ItemKind,
) -> Snapshot {
    controller
        .execute(
            snapshot_id,
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

/// Persisted DRAFT with root container, leaves `a -> b`, start `a`;
/// ready to activate
#[allow(dead_code)]
pub fn ready_draft(controller: &SnapshotLifecycleController, program_id: &str) -> String {
    let snapshot = controller.create_snapshot(program_id).unwrap();
    let id = snapshot.id().to_string();
    add_item(controller, &id, "root", None, ItemKind::Container);
    add_item(controller, &id, "a", Some("root"), ItemKind::Leaf);
    add_item(controller, &id, "b", Some("root"), ItemKind::Leaf);
    controller
        .execute(
            &id,
            Command::AddRelation {
                from_item_id: "a".to_string(),
                to_item_id: "b".to_string(),
            },
        )
        .unwrap();
    controller
        .execute(
            &id,
            Command::SetStartItem {
                item_id: "a".to_string(),
            },
        )
        .unwrap();
    id
}
