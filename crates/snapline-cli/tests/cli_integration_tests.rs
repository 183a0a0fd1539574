//! CLI integration tests
//!
//! Drive the `snapline` binary against an on-disk store and check that
//! commands delegate to the engine (locks, lifecycle, events) correctly.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn snapline(db: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_snapline"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_cli_builds_and_activates_snapshot() {
    // Given: A fresh store
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("store.db");

    // When: A snapshot is created, populated and activated through the CLI
    let id = stdout(&snapline(&db, &["snapshot", "create", "--program", "rust-101"]));
    stdout(&snapline(
        &db,
        &["snapshot", "add-item", &id, "--id", "root", "--name", "Root", "--kind", "container"],
    ));
    stdout(&snapline(
        &db,
        &[
            "snapshot", "add-item", &id, "--id", "a", "--name", "A", "--kind", "leaf", "--parent",
            "root",
        ],
    ));
    stdout(&snapline(&db, &["snapshot", "set-start", &id, "a"]));
    let activated = stdout(&snapline(&db, &["snapshot", "activate", &id]));

    // Then: It is reported ACTIVE and frozen against further edits
    assert_eq!(activated, format!("{} active", id));
    let rejected = snapline(
        &db,
        &["snapshot", "add-item", &id, "--name", "Late", "--kind", "leaf", "--parent", "root"],
    );
    assert!(!rejected.status.success());
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("ERR_IMMUTABLE_SNAPSHOT"));

    let history = stdout(&snapline(&db, &["snapshot", "history", &id]));
    assert!(history.contains("draft -> active"));
}

#[test]
fn test_cli_reports_unreachable_leaf() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("store.db");

    let id = stdout(&snapline(&db, &["snapshot", "create", "--program", "p"]));
    for leaf in ["a", "b"] {
        stdout(&snapline(
            &db,
            &["snapshot", "add-item", &id, "--id", leaf, "--name", leaf, "--kind", "leaf"],
        ));
    }
    stdout(&snapline(&db, &["snapshot", "set-start", &id, "a"]));

    let output = snapline(&db, &["snapshot", "activate", &id]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_UNREACHABLE_ITEMS"));
    assert!(stderr.contains('b'));
}

#[test]
fn test_cli_seed_import_and_outline() {
    // Given: A seed file asking for activation
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("store.db");
    let seed = dir.path().join("course.yaml");
    std::fs::write(
        &seed,
        r#"
schema_version: 0
program: rust-101
activate: true
start: intro
items:
  - key: week-1
    name: Week 1
    kind: container
    children:
      - { key: intro, name: Introduction, kind: leaf }
      - { key: ownership, name: Ownership, kind: leaf }
relations:
  - { from: intro, to: ownership }
"#,
    )
    .unwrap();

    // When: It is imported
    let output = stdout(&snapline(&db, &["seed", "import", seed.to_str().unwrap()]));

    // Then: The snapshot is imported, activated and listed
    assert!(output.contains("Activated snapshot"));
    let listing = stdout(&snapline(&db, &["snapshot", "list", "--program", "rust-101"]));
    assert_eq!(listing.lines().count(), 1);
    assert!(listing.contains("active"));

    let id = listing.split('\t').next().unwrap().to_string();
    let outline = stdout(&snapline(&db, &["snapshot", "outline", &id]));
    assert!(outline.contains("Week 1"));
    assert!(outline.contains("Introduction"));

    let path = stdout(&snapline(&db, &["snapshot", "path", &id]));
    let names: Vec<_> = path.lines().filter_map(|l| l.split('\t').nth(1)).collect();
    assert_eq!(names, vec!["Introduction", "Ownership"]);
}

#[test]
fn test_cli_show_item_prints_ancestor_path() {
    // Given: A draft with a nested lesson
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("store.db");
    let id = stdout(&snapline(&db, &["snapshot", "create", "--program", "p"]));
    stdout(&snapline(
        &db,
        &["snapshot", "add-item", &id, "--id", "course", "--name", "Course", "--kind", "container"],
    ));
    stdout(&snapline(
        &db,
        &[
            "snapshot", "add-item", &id, "--id", "week", "--name", "Week", "--kind", "container",
            "--parent", "course",
        ],
    ));
    stdout(&snapline(
        &db,
        &[
            "snapshot", "add-item", &id, "--id", "lesson", "--name", "Lesson", "--kind", "leaf",
            "--parent", "week",
        ],
    ));

    // When: The lesson is shown
    let shown = stdout(&snapline(&db, &["snapshot", "show", &id, "--item", "lesson"]));

    // Then: Its depth and ancestor path are printed
    assert!(shown.contains("depth: 2"));
    assert!(shown.lines().any(|l| l == "path: Course > Week > Lesson"));

    // And: An unknown item is an error
    let missing = snapline(&db, &["snapshot", "show", &id, "--item", "ghost"]);
    assert!(!missing.status.success());
}
