//! Hydration layer - rebuilds snapshot aggregates from SQLite rows
//!
//! Rows are decoded outside the rusqlite closures so that unexpected column
//! values surface as `Persistence` errors naming the table and column.
//! Every loaded aggregate passes through `Snapshot::from_parts`, so a
//! structurally corrupt database never produces a live snapshot.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use snapline_core::errors::{ExError, ExErrorKind, SnapshotError};
use snapline_core::model::{ItemKind, Snapshot, SnapshotItem, SnapshotParts, SnapshotRelation, SnapshotStatus};
use snapline_core::repository::SnapshotSummary;

use crate::errors::{corrupt_row, from_rusqlite, Result};

struct HeaderRow {
    id: String,
    program_id: String,
    status: String,
    start_item_id: Option<String>,
    version: i64,
    structure_digest: Option<String>,
    created_at: String,
    updated_at: String,
    activated_at: Option<String>,
}

struct ItemRow {
    id: String,
    name: String,
    parent_id: Option<String>,
    kind: String,
    learning_object_ref: Option<String>,
    depth: i64,
    position: i64,
}

/// Load one snapshot aggregate by id
///
/// # Errors
///
/// `NotFound` if the snapshot does not exist; `Persistence` for undecodable
/// rows; the structural error kind if the stored graph violates an invariant.
pub fn load_snapshot(conn: &Connection, snapshot_id: &str) -> Result<Snapshot> {
    let header = conn
        .query_row(
            "SELECT id, program_id, status, start_item_id, version, structure_digest,
                    created_at, updated_at, activated_at
             FROM snapshots WHERE id = ?1",
            [snapshot_id],
            |row| {
                Ok(HeaderRow {
                    id: row.get(0)?,
                    program_id: row.get(1)?,
                    status: row.get(2)?,
                    start_item_id: row.get(3)?,
                    version: row.get(4)?,
                    structure_digest: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                    activated_at: row.get(8)?,
                })
            },
        )
        .optional()
        .map_err(from_rusqlite)?
        .ok_or_else(|| {
            ExError::from(SnapshotError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })
        })?;

    let items = load_items(conn, snapshot_id)?;
    let relations = load_relations(conn, snapshot_id)?;

    let parts = SnapshotParts {
        status: parse_status("snapshots", &header.status)?,
        version: parse_unsigned("snapshots", "version", header.version)?,
        created_at: parse_timestamp("snapshots", "created_at", &header.created_at)?,
        updated_at: parse_timestamp("snapshots", "updated_at", &header.updated_at)?,
        activated_at: header
            .activated_at
            .as_deref()
            .map(|value| parse_timestamp("snapshots", "activated_at", value))
            .transpose()?,
        id: header.id,
        program_id: header.program_id,
        start_item_id: header.start_item_id,
        structure_digest: header.structure_digest,
        items,
        relations,
    };

    Snapshot::from_parts(parts).map_err(|e| ExError::from(e).with_op("hydrate"))
}

fn load_items(conn: &Connection, snapshot_id: &str) -> Result<Vec<SnapshotItem>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, parent_id, kind, learning_object_ref, depth, position
             FROM snapshot_items WHERE snapshot_id = ?1
             ORDER BY depth, position, id",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map([snapshot_id], |row| {
            Ok(ItemRow {
                id: row.get(0)?,
                name: row.get(1)?,
                parent_id: row.get(2)?,
                kind: row.get(3)?,
                learning_object_ref: row.get(4)?,
                depth: row.get(5)?,
                position: row.get(6)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|row| {
            let kind = ItemKind::parse(&row.kind)
                .ok_or_else(|| corrupt_row("snapshot_items", "kind", &row.kind))?;
            let depth = u8::try_from(row.depth)
                .map_err(|_| corrupt_row("snapshot_items", "depth", &row.depth.to_string()))?;
            let position = u32::try_from(row.position).map_err(|_| {
                corrupt_row("snapshot_items", "position", &row.position.to_string())
            })?;

            let mut item = SnapshotItem::new(row.id, row.name, kind);
            item.parent_id = row.parent_id;
            item.learning_object_ref = row.learning_object_ref;
            item.depth = depth;
            item.position = position;
            Ok(item)
        })
        .collect()
}

fn load_relations(conn: &Connection, snapshot_id: &str) -> Result<Vec<SnapshotRelation>> {
    let mut stmt = conn
        .prepare(
            "SELECT from_item_id, to_item_id FROM snapshot_relations
             WHERE snapshot_id = ?1 ORDER BY from_item_id, to_item_id",
        )
        .map_err(from_rusqlite)?;

    let relations = stmt
        .query_map([snapshot_id], |row| {
            Ok(SnapshotRelation::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    Ok(relations)
}

/// Id of the program's ACTIVE snapshot, if any
pub fn find_active_id(conn: &Connection, program_id: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM snapshots WHERE program_id = ?1 AND status = 'active'",
        [program_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(from_rusqlite)
}

pub fn count_active(conn: &Connection, program_id: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM snapshots WHERE program_id = ?1 AND status = 'active'",
            [program_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    usize::try_from(count).map_err(|_| corrupt_row("snapshots", "count", &count.to_string()))
}

/// Listing rows for every snapshot of a program, oldest first
pub fn load_summaries(conn: &Connection, program_id: &str) -> Result<Vec<SnapshotSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.program_id, s.status, s.version,
                    (SELECT COUNT(*) FROM snapshot_items i WHERE i.snapshot_id = s.id)
             FROM snapshots s
             WHERE s.program_id = ?1
             ORDER BY s.created_at, s.id",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map([program_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(id, program_id, status, version, item_count)| {
            Ok(SnapshotSummary {
                id,
                program_id,
                status: parse_status("snapshots", &status)?,
                version: parse_unsigned("snapshots", "version", version)?,
                item_count: usize::try_from(item_count).map_err(|_| {
                    corrupt_row("snapshot_items", "count", &item_count.to_string())
                })?,
            })
        })
        .collect()
}

/// Persisted timestamp format: RFC3339 UTC with nanoseconds, so values
/// round-trip exactly and sort lexicographically
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(table: &str, column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupt_row(table, column, value))
}

pub(crate) fn parse_status(table: &str, value: &str) -> Result<SnapshotStatus> {
    SnapshotStatus::parse(value).ok_or_else(|| corrupt_row(table, "status", value))
}

pub(crate) fn parse_unsigned(table: &str, column: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| corrupt_row(table, column, &value.to_string()))
}

/// SQLite integers are signed; versions beyond i64::MAX cannot be stored
pub(crate) fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        ExError::new(ExErrorKind::Persistence)
            .with_op("sqlite")
            .with_message(format!("Value {} does not fit an SQLite integer", value))
    })
}
