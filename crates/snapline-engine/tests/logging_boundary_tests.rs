// The controller owns start/end/end_error boundary events

mod common;

use std::sync::Arc;

use common::ready_draft;
use snapline_core::logging_facility::init_test_capture;
use snapline_core::policy::DenyAllActivationPolicyHook;
use snapline_core::MemoryRepository;
use snapline_core_types::schema::{FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_PROGRAM_ID, FIELD_REQUEST_ID, FIELD_SNAPSHOT_ID};
use snapline_core_types::{RequestContext, RequestId};
use snapline_engine::{apply_engine_command, EngineCommand, EngineConfig, SnapshotLifecycleController};
use snapline_store::seed::parse_seed_str;

#[test]
fn test_activation_emits_start_and_end() {
    let capture = init_test_capture();
    let controller =
        SnapshotLifecycleController::new(Arc::new(MemoryRepository::new()), EngineConfig::default());
    let id = ready_draft(&controller, "program-log-1");

    controller.request_activation(&id).unwrap();

    let events: Vec<_> = capture
        .events_for_op("snapshot.activate")
        .into_iter()
        .filter(|e| e.field(FIELD_SNAPSHOT_ID) == Some(id.as_str()))
        .collect();
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.clone()).collect();
    assert_eq!(kinds, vec!["start", "end"]);
    assert!(events[1].field(FIELD_DURATION_MS).is_some());
}

#[test]
fn test_denied_activation_emits_end_error_with_code() {
    let capture = init_test_capture();
    let controller =
        SnapshotLifecycleController::new(Arc::new(MemoryRepository::new()), EngineConfig::default())
            .with_policy_hook(Arc::new(DenyAllActivationPolicyHook));
    let id = ready_draft(&controller, "program-log-2");

    controller.request_activation(&id).unwrap_err();

    let errors: Vec<_> = capture
        .events_for_op("snapshot.activate")
        .into_iter()
        .filter(|e| e.field(FIELD_SNAPSHOT_ID) == Some(id.as_str()))
        .filter(|e| e.event.as_deref() == Some("end_error"))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_POLICY_DENIED"));
}

#[test]
fn test_engine_command_events_carry_request_id() {
    let capture = init_test_capture();
    let controller =
        SnapshotLifecycleController::new(Arc::new(MemoryRepository::new()), EngineConfig::default());
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-log-3".to_string()));

    apply_engine_command(
        &controller,
        &ctx,
        EngineCommand::CreateSnapshot {
            program_id: "program-log-3".to_string(),
        },
    )
    .unwrap();

    let events: Vec<_> = capture
        .events_for_op("snapshot.create")
        .into_iter()
        .filter(|e| e.field(FIELD_PROGRAM_ID) == Some("program-log-3"))
        .collect();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e.field(FIELD_REQUEST_ID) == Some("req-log-3")));
}

#[test]
fn test_seed_import_emits_start_and_end() {
    let capture = init_test_capture();
    let controller =
        SnapshotLifecycleController::new(Arc::new(MemoryRepository::new()), EngineConfig::default());
    let document = parse_seed_str(
        r#"
schema_version: 0
program: program-log-4
start: intro
items:
  - { key: intro, name: Intro, kind: leaf }
  - { key: next, name: Next, kind: leaf }
relations:
  - { from: intro, to: next }
"#,
    )
    .unwrap();

    let report = controller.import_seed(&document).unwrap();

    let events: Vec<_> = capture
        .events_for_op("seed.import")
        .into_iter()
        .filter(|e| e.field(FIELD_PROGRAM_ID) == Some("program-log-4"))
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some("start"));
    assert_eq!(events[1].event.as_deref(), Some("end"));
    assert_eq!(events[1].field(FIELD_SNAPSHOT_ID), Some(report.snapshot_id.as_str()));
    assert_eq!(controller.load(&report.snapshot_id).unwrap().item_count(), 2);
}

#[test]
fn test_failed_seed_import_emits_end_error() {
    let capture = init_test_capture();
    let controller =
        SnapshotLifecycleController::new(Arc::new(MemoryRepository::new()), EngineConfig::default());
    let document = parse_seed_str(
        r#"
schema_version: 0
program: program-log-5
items:
  - { key: a, name: A, kind: leaf }
  - { key: b, name: B, kind: leaf }
relations:
  - { from: a, to: b }
  - { from: b, to: a }
"#,
    )
    .unwrap();

    let err = controller.import_seed(&document).unwrap_err();

    assert_eq!(err.op(), Some("snapshot.add_relation"));
    let errors: Vec<_> = capture
        .events_for_op("seed.import")
        .into_iter()
        .filter(|e| e.field(FIELD_PROGRAM_ID) == Some("program-log-5"))
        .filter(|e| e.event.as_deref() == Some("end_error"))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_CYCLE_DETECTED"));
    assert!(controller.list_for_program("program-log-5").unwrap().is_empty());
}
