//! Snapshot Lifecycle Controller
//!
//! ## Logging Ownership
//!
//! The controller owns lifecycle logging for every snapshot operation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Core and store emit only `tracing::debug!()` details.
//!
//! ## Activation pipeline (in order):
//! 1. Resolve the snapshot's program
//! 2. Program lock, then snapshot lock (bounded waits)
//! 3. Reload under the locks
//! 4. Policy hook allow/deny check (hard stop, no writes)
//! 5. Read the program's ACTIVE snapshot through the Repository Port
//! 6. `apply(Activate)`: full structural re-validation and status flip
//! 7. Save (optimistic version check, storage unique-index backstop)
//! 8. Publish `SnapshotActivated`

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use snapline_core::errors::{ExError, ExResult};
use snapline_core::events::{NoopEventSink, SnapshotEvent, SnapshotEventSink};
use snapline_core::model::Snapshot;
use snapline_core::policy::{ActivationPolicyHook, NoopActivationPolicyHook};
use snapline_core::repository::{SnapshotRepository, SnapshotSummary};
use snapline_core::{apply, log_op_end, log_op_error, log_op_start, Command};
use snapline_store::seed::{self, SeedDocument, SeedImportReport};
use snapline_store::SqliteSnapshotRepository;

use crate::config::EngineConfig;
use crate::locks::{program_key, snapshot_key, LockTable};

pub struct SnapshotLifecycleController {
    repo: Arc<dyn SnapshotRepository>,
    events: Arc<dyn SnapshotEventSink>,
    policy: Arc<dyn ActivationPolicyHook>,
    locks: LockTable,
    config: EngineConfig,
}

impl SnapshotLifecycleController {
    /// Controller over `repo` with a no-op policy hook and event sink
    pub fn new(repo: Arc<dyn SnapshotRepository>, config: EngineConfig) -> Self {
        Self {
            repo,
            events: Arc::new(NoopEventSink),
            policy: Arc::new(NoopActivationPolicyHook),
            locks: LockTable::new(config.lock_timeout()),
            config,
        }
    }

    /// Controller over a SQLite database whose busy timeout matches the
    /// configured lock timeout
    pub fn open_sqlite(path: &Path, config: EngineConfig) -> ExResult<Self> {
        let repo = SqliteSnapshotRepository::open(path, config.lock_timeout())?;
        Ok(Self::new(Arc::new(repo), config))
    }

    pub fn with_event_sink(mut self, events: Arc<dyn SnapshotEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_policy_hook(mut self, policy: Arc<dyn ActivationPolicyHook>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn SnapshotRepository> {
        &self.repo
    }

    /// Create and persist an empty DRAFT snapshot for a program
    pub fn create_snapshot(&self, program_id: &str) -> ExResult<Snapshot> {
        log_op_start!("snapshot.create", program_id = program_id);
        let start = Instant::now();

        let mut snapshot = Snapshot::create(program_id);
        let result = self.repo.save(&snapshot).map_err(|e| ensure_op(e, "snapshot.create"));
        match result {
            Ok(version) => {
                snapshot.mark_persisted(version);
                log_op_end!(
                    "snapshot.create",
                    duration_ms = elapsed_ms(start),
                    program_id = program_id,
                    snapshot_id = snapshot.id()
                );
                Ok(snapshot)
            }
            Err(e) => {
                log_op_error!(
                    "snapshot.create",
                    e,
                    duration_ms = elapsed_ms(start),
                    program_id = program_id
                );
                Err(e)
            }
        }
    }

    /// Execute any command against a persisted snapshot
    ///
    /// Structural commands run as one locked load-apply-save cycle.
    /// Lifecycle commands are routed to their dedicated pipelines; the
    /// `competing_active` carried by `Activate` is ignored and re-read
    /// under the program lock.
    pub fn execute(&self, snapshot_id: &str, cmd: Command) -> ExResult<Snapshot> {
        match cmd {
            Command::Activate { .. } => self.request_activation(snapshot_id),
            Command::Complete => self.complete(snapshot_id),
            Command::Archive => self.archive(snapshot_id),
            cmd => {
                let op = cmd.op_name();
                self.run_op(op, snapshot_id, || {
                    let _lock = self.locks.acquire(snapshot_key(snapshot_id))?;
                    let snapshot = self.repo.load(snapshot_id)?;
                    let snapshot = apply(snapshot, cmd).map_err(ExError::from)?;
                    self.persist(snapshot)
                })
            }
        }
    }

    /// Activate a DRAFT snapshot
    ///
    /// The uniqueness check and the status flip run under the program lock,
    /// so of two racing activations for one program exactly one succeeds and
    /// the other fails with `AnotherSnapshotActive`. `SnapshotActivated` is
    /// published only after the save committed.
    ///
    /// # Errors
    ///
    /// * `PolicyDenied` - the policy hook refused; nothing is written
    /// * `AnotherSnapshotActive` - another snapshot of the program is ACTIVE
    /// * `LockTimeout` - a lock stayed held past the configured timeout
    /// * any structural or state-machine error from activation
    pub fn request_activation(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.run_op("snapshot.activate", snapshot_id, || {
            let program_id = self.repo.load(snapshot_id)?.program_id().to_string();

            let _program_lock = self.locks.acquire(program_key(&program_id))?;
            let _snapshot_lock = self.locks.acquire(snapshot_key(snapshot_id))?;

            let snapshot = self.repo.load(snapshot_id)?;
            self.policy.check(&snapshot)?;

            let competing_active = if self.repo.count_active_for_program(&program_id)? > 0 {
                self.repo
                    .find_active_for_program(&program_id)?
                    .map(|active| active.id().to_string())
            } else {
                None
            };
            tracing::debug!(
                snapshot_id,
                program_id = %program_id,
                competing_active = ?competing_active,
                "activation under program lock"
            );

            let snapshot =
                apply(snapshot, Command::Activate { competing_active }).map_err(ExError::from)?;
            let snapshot = self.persist(snapshot)?;

            self.events.publish(SnapshotEvent::SnapshotActivated {
                snapshot_id: snapshot.id().to_string(),
                program_id: snapshot.program_id().to_string(),
            });
            Ok(snapshot)
        })
    }

    /// ACTIVE -> COMPLETED, then publish `SnapshotCompleted`
    pub fn complete(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.run_op("snapshot.complete", snapshot_id, || {
            let snapshot = self.transition(snapshot_id, Command::Complete)?;
            self.events.publish(SnapshotEvent::SnapshotCompleted {
                snapshot_id: snapshot.id().to_string(),
                program_id: snapshot.program_id().to_string(),
            });
            Ok(snapshot)
        })
    }

    /// Any non-archived state -> ARCHIVED, then publish `SnapshotArchived`
    pub fn archive(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.run_op("snapshot.archive", snapshot_id, || {
            let snapshot = self.transition(snapshot_id, Command::Archive)?;
            self.events.publish(SnapshotEvent::SnapshotArchived {
                snapshot_id: snapshot.id().to_string(),
                program_id: snapshot.program_id().to_string(),
            });
            Ok(snapshot)
        })
    }

    /// Consistent read; takes no lock
    pub fn load(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.repo.load(snapshot_id)
    }

    /// Import a parsed seed document as a new DRAFT snapshot
    ///
    /// Activation, when the seed asks for it, is a separate
    /// [`Self::request_activation`] call.
    pub fn import_seed(&self, document: &SeedDocument) -> ExResult<SeedImportReport> {
        const OP: &str = "seed.import";
        let program_id = document.program.as_str();
        log_op_start!(OP, program_id = program_id);
        let start = Instant::now();

        match seed::import_seed(self.repo.as_ref(), document).map_err(|e| ensure_op(e, OP)) {
            Ok(report) => {
                log_op_end!(
                    OP,
                    duration_ms = elapsed_ms(start),
                    program_id = program_id,
                    snapshot_id = report.snapshot_id.as_str(),
                    item_count = report.item_count
                );
                Ok(report)
            }
            Err(e) => {
                log_op_error!(OP, e, duration_ms = elapsed_ms(start), program_id = program_id);
                Err(e)
            }
        }
    }

    pub fn active_for_program(&self, program_id: &str) -> ExResult<Option<Snapshot>> {
        self.repo.find_active_for_program(program_id)
    }

    pub fn list_for_program(&self, program_id: &str) -> ExResult<Vec<SnapshotSummary>> {
        self.repo.list_for_program(program_id)
    }

    fn transition(&self, snapshot_id: &str, cmd: Command) -> ExResult<Snapshot> {
        let _lock = self.locks.acquire(snapshot_key(snapshot_id))?;
        let snapshot = self.repo.load(snapshot_id)?;
        let snapshot = apply(snapshot, cmd).map_err(ExError::from)?;
        self.persist(snapshot)
    }

    fn persist(&self, mut snapshot: Snapshot) -> ExResult<Snapshot> {
        let version = self.repo.save(&snapshot)?;
        snapshot.mark_persisted(version);
        Ok(snapshot)
    }

    fn run_op<T>(
        &self,
        op: &'static str,
        snapshot_id: &str,
        f: impl FnOnce() -> ExResult<T>,
    ) -> ExResult<T> {
        log_op_start!(op, snapshot_id = snapshot_id);
        let start = Instant::now();

        match f().map_err(|e| ensure_op(e, op)) {
            Ok(value) => {
                log_op_end!(op, duration_ms = elapsed_ms(start), snapshot_id = snapshot_id);
                Ok(value)
            }
            Err(e) => {
                log_op_error!(op, e, duration_ms = elapsed_ms(start), snapshot_id = snapshot_id);
                Err(e)
            }
        }
    }
}

/// Tag an error with the boundary op unless a lower layer already named one
fn ensure_op(err: ExError, op: &str) -> ExError {
    if err.op().is_some() {
        err
    } else {
        err.with_op(op)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
