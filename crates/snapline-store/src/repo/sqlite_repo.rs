//! SQLite repository implementation
//!
//! Saves whole snapshot aggregates inside one `BEGIN IMMEDIATE` transaction:
//! the version check, the header write, the item/relation rewrite and the
//! transition log entry commit together or not at all. The partial unique
//! index `ux_snapshots_one_active_per_program` makes "one ACTIVE snapshot per
//! program" hold even across processes sharing the database file.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use snapline_core::errors::{ExError, ExResult, SnapshotError};
use snapline_core::model::{Snapshot, SnapshotStatus};
use snapline_core::repository::{SnapshotRepository, SnapshotSummary};

use crate::db;
use crate::errors::{from_rusqlite, is_unique_violation, Result};
use crate::migrations::apply_migrations;
use crate::repo::hydration::{self, format_timestamp, parse_status, parse_timestamp, parse_unsigned, to_sql_int};

/// One row of the lifecycle transition log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub snapshot_id: String,
    /// `None` for the row written when the snapshot was first saved
    pub from_status: Option<SnapshotStatus>,
    pub to_status: SnapshotStatus,
    /// Snapshot version produced by the save that recorded the transition
    pub version: u64,
    pub recorded_at: DateTime<Utc>,
}

/// SQLite-backed [`SnapshotRepository`]
pub struct SqliteSnapshotRepository {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotRepository {
    /// Open (or create) a database file, configure it and apply migrations
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = db::open(path)?;
        Self::from_connection(conn, busy_timeout)
    }

    /// Fresh in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Self::from_connection(conn, db::DEFAULT_BUSY_TIMEOUT)
    }

    pub fn from_connection(mut conn: Connection, busy_timeout: Duration) -> Result<Self> {
        db::configure(&conn, busy_timeout)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a multi-statement read inside one deferred transaction, so every
    /// query sees the same committed state even while another connection
    /// is saving
    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(from_rusqlite)?;
        let value = f(&tx)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(value)
    }

    /// Lifecycle transitions recorded for a snapshot, oldest first
    pub fn transition_history(&self, snapshot_id: &str) -> Result<Vec<TransitionRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT snapshot_id, from_status, to_status, version, recorded_at
                 FROM snapshot_transitions WHERE snapshot_id = ?1 ORDER BY id",
            )
            .map_err(from_rusqlite)?;

        let rows = stmt
            .query_map([snapshot_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter()
            .map(|(snapshot_id, from_status, to_status, version, recorded_at)| {
                Ok(TransitionRecord {
                    snapshot_id,
                    from_status: from_status
                        .as_deref()
                        .map(|s| parse_status("snapshot_transitions", s))
                        .transpose()?,
                    to_status: parse_status("snapshot_transitions", &to_status)?,
                    version: parse_unsigned("snapshot_transitions", "version", version)?,
                    recorded_at: parse_timestamp(
                        "snapshot_transitions",
                        "recorded_at",
                        &recorded_at,
                    )?,
                })
            })
            .collect()
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.read(|conn| hydration::load_snapshot(conn, snapshot_id))
    }

    fn save(&self, snapshot: &Snapshot) -> ExResult<u64> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| write_error(e, snapshot.id()))?;

        let stored: Option<(i64, String)> = tx
            .query_row(
                "SELECT version, status FROM snapshots WHERE id = ?1",
                [snapshot.id()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;

        let (stored_version, previous_status) = match stored {
            Some((version, status)) => (
                parse_unsigned("snapshots", "version", version)?,
                Some(parse_status("snapshots", &status)?),
            ),
            None => (0, None),
        };

        if stored_version != snapshot.version() {
            return Err(SnapshotError::ConcurrentModification {
                snapshot_id: snapshot.id().to_string(),
                expected_version: snapshot.version(),
                actual_version: stored_version,
            }
            .into());
        }

        let version = stored_version + 1;
        write_header(&tx, snapshot, version, previous_status.is_none())?;
        replace_structure(&tx, snapshot)?;

        if previous_status != Some(snapshot.status()) {
            record_transition(&tx, snapshot, previous_status, version)?;
        }

        tx.commit().map_err(|e| write_error(e, snapshot.id()))?;

        tracing::debug!(
            snapshot_id = snapshot.id(),
            version,
            status = snapshot.status().as_str(),
            "snapshot saved"
        );
        Ok(version)
    }

    fn find_active_for_program(&self, program_id: &str) -> ExResult<Option<Snapshot>> {
        self.read(|conn| match hydration::find_active_id(conn, program_id)? {
            Some(id) => hydration::load_snapshot(conn, &id).map(Some),
            None => Ok(None),
        })
    }

    fn count_active_for_program(&self, program_id: &str) -> ExResult<usize> {
        hydration::count_active(&self.conn(), program_id)
    }

    fn list_for_program(&self, program_id: &str) -> ExResult<Vec<SnapshotSummary>> {
        self.read(|conn| hydration::load_summaries(conn, program_id))
    }
}

fn write_header(tx: &Transaction, snapshot: &Snapshot, version: u64, insert: bool) -> Result<()> {
    let version_sql = to_sql_int(version)?;
    let activated_at = snapshot.activated_at().map(format_timestamp);

    let result = if insert {
        tx.execute(
            "INSERT INTO snapshots (id, program_id, status, start_item_id, version,
                                    structure_digest, created_at, updated_at, activated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                snapshot.id(),
                snapshot.program_id(),
                snapshot.status().as_str(),
                snapshot.start_item_id(),
                version_sql,
                snapshot.structure_digest(),
                format_timestamp(snapshot.created_at()),
                format_timestamp(snapshot.updated_at()),
                activated_at,
            ],
        )
    } else {
        tx.execute(
            "UPDATE snapshots
             SET status = ?2, start_item_id = ?3, version = ?4, structure_digest = ?5,
                 updated_at = ?6, activated_at = ?7
             WHERE id = ?1 AND version = ?8",
            rusqlite::params![
                snapshot.id(),
                snapshot.status().as_str(),
                snapshot.start_item_id(),
                version_sql,
                snapshot.structure_digest(),
                format_timestamp(snapshot.updated_at()),
                activated_at,
                to_sql_int(snapshot.version())?,
            ],
        )
    };

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e, "snapshots.program_id") => {
            let active_snapshot_id = tx
                .query_row(
                    "SELECT id FROM snapshots WHERE program_id = ?1 AND status = 'active' AND id <> ?2",
                    [snapshot.program_id(), snapshot.id()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(from_rusqlite)?
                .unwrap_or_default();
            Err(SnapshotError::AnotherSnapshotActive {
                program_id: snapshot.program_id().to_string(),
                active_snapshot_id,
            }
            .into())
        }
        Err(e) => Err(write_error(e, snapshot.id())),
    }
}

fn replace_structure(tx: &Transaction, snapshot: &Snapshot) -> Result<()> {
    tx.execute(
        "DELETE FROM snapshot_relations WHERE snapshot_id = ?1",
        [snapshot.id()],
    )
    .map_err(from_rusqlite)?;
    tx.execute(
        "DELETE FROM snapshot_items WHERE snapshot_id = ?1",
        [snapshot.id()],
    )
    .map_err(from_rusqlite)?;

    let mut insert_item = tx
        .prepare_cached(
            "INSERT INTO snapshot_items (snapshot_id, id, name, parent_id, kind,
                                         learning_object_ref, depth, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(from_rusqlite)?;
    for item in snapshot.items() {
        insert_item
            .execute(rusqlite::params![
                snapshot.id(),
                item.id,
                item.name,
                item.parent_id,
                item.kind.as_str(),
                item.learning_object_ref,
                item.depth,
                item.position,
            ])
            .map_err(from_rusqlite)?;
    }

    let mut insert_relation = tx
        .prepare_cached(
            "INSERT INTO snapshot_relations (snapshot_id, from_item_id, to_item_id)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(from_rusqlite)?;
    for relation in snapshot.relations() {
        insert_relation
            .execute(rusqlite::params![
                snapshot.id(),
                relation.from_item_id,
                relation.to_item_id,
            ])
            .map_err(from_rusqlite)?;
    }

    Ok(())
}

fn record_transition(
    tx: &Transaction,
    snapshot: &Snapshot,
    from_status: Option<SnapshotStatus>,
    version: u64,
) -> Result<()> {
    tx.execute(
        "INSERT INTO snapshot_transitions (snapshot_id, from_status, to_status, version, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            snapshot.id(),
            from_status.map(SnapshotStatus::as_str),
            snapshot.status().as_str(),
            to_sql_int(version)?,
            format_timestamp(Utc::now()),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

fn write_error(err: rusqlite::Error, snapshot_id: &str) -> ExError {
    from_rusqlite(err).with_snapshot_id(snapshot_id)
}
