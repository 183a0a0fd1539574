//! Snapshot commands
//!
//! Usage: snapline snapshot <SUBCOMMAND>
//!
//! Every mutation goes through `apply_engine_command`, so edits take the
//! snapshot lock and activation takes the program lock.

use clap::{Args, Subcommand, ValueEnum};
use snapline_core::render::render_outline;
use snapline_core::traversal::{ancestor_path, learning_path};
use snapline_core::{Command, ItemKind, RemovalMode};
use snapline_core_types::RequestContext;
use snapline_engine::{apply_engine_command, EngineCommand};

use crate::Session;

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Container,
    Leaf,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Container => ItemKind::Container,
            KindArg::Leaf => ItemKind::Leaf,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Create an empty DRAFT snapshot for a program
    Create {
        #[arg(long)]
        program: String,
    },
    /// Add an item under a container (or at top level)
    AddItem {
        snapshot_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Parent container id; omit for a top-level item
        #[arg(long)]
        parent: Option<String>,
        /// Item id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        learning_object: Option<String>,
    },
    RenameItem {
        snapshot_id: String,
        item_id: String,
        name: String,
    },
    /// Re-parent an item and its subtree
    MoveItem {
        snapshot_id: String,
        item_id: String,
        /// New parent container; omit to move to top level
        #[arg(long)]
        parent: Option<String>,
    },
    /// Set (or with no --reference, clear) a leaf's learning object
    SetLearningObject {
        snapshot_id: String,
        item_id: String,
        #[arg(long)]
        reference: Option<String>,
    },
    /// Remove an item, its subtree and touching relations
    RemoveItem {
        snapshot_id: String,
        item_id: String,
        /// Allow the removal even if leaves become unreachable from the start item
        #[arg(long)]
        acknowledge_disconnect: bool,
    },
    AddRelation {
        snapshot_id: String,
        from: String,
        to: String,
    },
    RemoveRelation {
        snapshot_id: String,
        from: String,
        to: String,
    },
    SetStart {
        snapshot_id: String,
        item_id: String,
    },
    Activate {
        snapshot_id: String,
    },
    Complete {
        snapshot_id: String,
    },
    Archive {
        snapshot_id: String,
    },
    /// Print snapshot status and structure
    Show {
        snapshot_id: String,
        #[arg(long)]
        json: bool,
        /// Also print one item and its ancestor path
        #[arg(long)]
        item: Option<String>,
    },
    /// Print the Markdown outline
    Outline {
        snapshot_id: String,
    },
    /// Print the learning path from the start item
    Path {
        snapshot_id: String,
    },
    /// List a program's snapshots, oldest first
    List {
        #[arg(long)]
        program: String,
    },
    /// Print the lifecycle transition log
    History {
        snapshot_id: String,
    },
}

/// Execute snapshot command
pub fn execute(args: SnapshotArgs, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        SnapshotCommand::Create { program } => {
            let result = run(session, EngineCommand::CreateSnapshot { program_id: program })?;
            println!("{}", result.id());
        }
        SnapshotCommand::AddItem {
            snapshot_id,
            name,
            kind,
            parent,
            id,
            learning_object,
        } => {
            let before = session.controller.load(&snapshot_id)?;
            let snapshot = edit(
                session,
                snapshot_id,
                Command::AddItem {
                    item_id: id,
                    name,
                    parent_id: parent,
                    kind: kind.into(),
                    learning_object_ref: learning_object,
                },
            )?;
            // The new item is the one id absent before the edit
            if let Some(item) = snapshot.items().find(|i| !before.contains_item(&i.id)) {
                println!("{}", item.id);
            };
        }
        SnapshotCommand::RenameItem {
            snapshot_id,
            item_id,
            name,
        } => {
            edit(session, snapshot_id, Command::RenameItem { item_id, name })?;
        }
        SnapshotCommand::MoveItem {
            snapshot_id,
            item_id,
            parent,
        } => {
            edit(
                session,
                snapshot_id,
                Command::MoveItem {
                    item_id,
                    new_parent_id: parent,
                },
            )?;
        }
        SnapshotCommand::SetLearningObject {
            snapshot_id,
            item_id,
            reference,
        } => {
            edit(
                session,
                snapshot_id,
                Command::SetLearningObject {
                    item_id,
                    learning_object_ref: reference,
                },
            )?;
        }
        SnapshotCommand::RemoveItem {
            snapshot_id,
            item_id,
            acknowledge_disconnect,
        } => {
            let mode = if acknowledge_disconnect {
                RemovalMode::AcknowledgeDisconnect
            } else {
                RemovalMode::Strict
            };
            edit(session, snapshot_id, Command::RemoveItem { item_id, mode })?;
        }
        SnapshotCommand::AddRelation {
            snapshot_id,
            from,
            to,
        } => {
            edit(
                session,
                snapshot_id,
                Command::AddRelation {
                    from_item_id: from,
                    to_item_id: to,
                },
            )?;
        }
        SnapshotCommand::RemoveRelation {
            snapshot_id,
            from,
            to,
        } => {
            edit(
                session,
                snapshot_id,
                Command::RemoveRelation {
                    from_item_id: from,
                    to_item_id: to,
                },
            )?;
        }
        SnapshotCommand::SetStart {
            snapshot_id,
            item_id,
        } => {
            edit(session, snapshot_id, Command::SetStartItem { item_id })?;
        }
        SnapshotCommand::Activate { snapshot_id } => {
            let snapshot = run(session, EngineCommand::RequestActivation { snapshot_id })?;
            println!("{} {}", snapshot.id(), snapshot.status());
        }
        SnapshotCommand::Complete { snapshot_id } => {
            let snapshot = run(session, EngineCommand::Complete { snapshot_id })?;
            println!("{} {}", snapshot.id(), snapshot.status());
        }
        SnapshotCommand::Archive { snapshot_id } => {
            let snapshot = run(session, EngineCommand::Archive { snapshot_id })?;
            println!("{} {}", snapshot.id(), snapshot.status());
        }
        SnapshotCommand::Show {
            snapshot_id,
            json,
            item,
        } => {
            let snapshot = session.controller.load(&snapshot_id)?;
            let item = match item {
                Some(item_id) => Some((
                    snapshot.get_item(&item_id)?.clone(),
                    ancestor_path(&snapshot, &item_id)?,
                )),
                None => None,
            };
            if json {
                let value = match &item {
                    Some((item, path)) => serde_json::json!({ "item": item, "path": path }),
                    None => serde_json::to_value(&snapshot)?,
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if let Some((item, path)) = item {
                println!("item: {}", item.id);
                println!("name: {}", item.name);
                println!("kind: {}", item.kind);
                println!("depth: {}", item.depth);
                if let Some(learning_object) = &item.learning_object_ref {
                    println!("learning_object: {}", learning_object);
                }
                let names = path
                    .iter()
                    .map(|id| snapshot.get_item(id).map(|i| i.name.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                println!("path: {}", names.join(" > "));
            } else {
                println!("id: {}", snapshot.id());
                println!("program: {}", snapshot.program_id());
                println!("status: {}", snapshot.status());
                println!("version: {}", snapshot.version());
                println!("items: {}", snapshot.item_count());
                println!("relations: {}", snapshot.relation_graph().len());
                println!("start: {}", snapshot.start_item_id().unwrap_or("-"));
                if let Some(digest) = snapshot.structure_digest() {
                    println!("structure_digest: {}", digest);
                }
            }
        }
        SnapshotCommand::Outline { snapshot_id } => {
            let snapshot = session.controller.load(&snapshot_id)?;
            print!("{}", render_outline(&snapshot));
        }
        SnapshotCommand::Path { snapshot_id } => {
            let snapshot = session.controller.load(&snapshot_id)?;
            for item_id in learning_path(&snapshot)? {
                let item = snapshot.get_item(&item_id)?;
                println!("{}\t{}", item.id, item.name);
            }
        }
        SnapshotCommand::List { program } => {
            for summary in session.controller.list_for_program(&program)? {
                println!(
                    "{}\t{}\tv{}\t{} items",
                    summary.id, summary.status, summary.version, summary.item_count
                );
            }
        }
        SnapshotCommand::History { snapshot_id } => {
            for record in session.repo.transition_history(&snapshot_id)? {
                println!(
                    "{}\t{} -> {}\tv{}",
                    record.recorded_at.to_rfc3339(),
                    record.from_status.map_or("-", |s| s.as_str()),
                    record.to_status,
                    record.version
                );
            }
        }
    }

    Ok(())
}

fn run(
    session: &Session,
    cmd: EngineCommand,
) -> Result<snapline_core::Snapshot, Box<dyn std::error::Error>> {
    let result = apply_engine_command(&session.controller, &RequestContext::new(), cmd)?;
    Ok(result.into_snapshot())
}

fn edit(
    session: &Session,
    snapshot_id: String,
    command: Command,
) -> Result<snapline_core::Snapshot, Box<dyn std::error::Error>> {
    run(
        session,
        EngineCommand::Execute {
            snapshot_id,
            command,
        },
    )
}
