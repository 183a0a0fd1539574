//! Engine-level commands carrying request correlation.

#![allow(clippy::result_large_err)]

use snapline_core::errors::{ExError, ExResult};
use snapline_core::logging_facility::request_span;
use snapline_core::model::Snapshot;
use snapline_core::Command;
use snapline_core_types::RequestContext;

use crate::controller::SnapshotLifecycleController;

/// Engine-level commands that require I/O (repository, locks, events).
#[derive(Debug, Clone)]
pub enum EngineCommand {
    CreateSnapshot {
        program_id: String,
    },
    /// Structural edit (or lifecycle command) on an existing snapshot
    Execute {
        snapshot_id: String,
        command: Command,
    },
    RequestActivation {
        snapshot_id: String,
    },
    Complete {
        snapshot_id: String,
    },
    Archive {
        snapshot_id: String,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Created(Snapshot),
    Updated(Snapshot),
    Transitioned(Snapshot),
}

impl EngineCommandResult {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            EngineCommandResult::Created(s)
            | EngineCommandResult::Updated(s)
            | EngineCommandResult::Transitioned(s) => s,
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        match self {
            EngineCommandResult::Created(s)
            | EngineCommandResult::Updated(s)
            | EngineCommandResult::Transitioned(s) => s,
        }
    }
}

/// Apply an engine command inside the request's correlation span.
///
/// Every log event emitted while the command runs carries the request id,
/// and a failure is returned with the request and trace ids attached.
pub fn apply_engine_command(
    controller: &SnapshotLifecycleController,
    ctx: &RequestContext,
    cmd: EngineCommand,
) -> ExResult<EngineCommandResult> {
    let _span = request_span(ctx).entered();

    let result = match cmd {
        EngineCommand::CreateSnapshot { program_id } => controller
            .create_snapshot(&program_id)
            .map(EngineCommandResult::Created),
        EngineCommand::Execute {
            snapshot_id,
            command,
        } => {
            let structural = command.is_structural();
            controller
                .execute(&snapshot_id, command)
                .map(|s| {
                    if structural {
                        EngineCommandResult::Updated(s)
                    } else {
                        EngineCommandResult::Transitioned(s)
                    }
                })
        }
        EngineCommand::RequestActivation { snapshot_id } => controller
            .request_activation(&snapshot_id)
            .map(EngineCommandResult::Transitioned),
        EngineCommand::Complete { snapshot_id } => controller
            .complete(&snapshot_id)
            .map(EngineCommandResult::Transitioned),
        EngineCommand::Archive { snapshot_id } => controller
            .archive(&snapshot_id)
            .map(EngineCommandResult::Transitioned),
    };

    result.map_err(|e| correlate(e, ctx))
}

fn correlate(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
