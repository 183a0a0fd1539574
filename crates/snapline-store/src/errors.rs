//! Error handling for snapline-store
//!
//! Wraps snapline-core ExError with store-specific helpers

use rusqlite::ErrorCode;
use snapline_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error, keeping the SQLite failure as its source
pub fn migration_error(migration_id: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, err))
        .with_source(from_rusqlite(err))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a seed validation error
pub fn seed_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("seed_parse")
        .with_message(reason.to_string())
}

/// Create a row-decoding error for a column holding an unexpected value
pub fn corrupt_row(table: &str, column: &str, value: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("hydrate")
        .with_message(format!(
            "Unexpected value '{}' in {}.{}",
            value, table, column
        ))
}

/// Create a database error from rusqlite::Error
///
/// Busy/locked past the busy timeout is lock contention (`LockTimeout`);
/// CHECK, UNIQUE and foreign-key failures are `ConstraintViolation`;
/// everything else is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = if is_busy(&err) {
        ExErrorKind::LockTimeout
    } else if is_constraint(&err) {
        ExErrorKind::ConstraintViolation
    } else {
        ExErrorKind::Persistence
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Whether `err` is a UNIQUE violation naming `target` (e.g. `snapshots.program_id`)
pub fn is_unique_violation(err: &rusqlite::Error, target: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(message)) => {
            e.code == ErrorCode::ConstraintViolation
                && message.contains("UNIQUE")
                && message.contains(target)
        }
        _ => false,
    }
}

/// Whether `err` means the database stayed locked past the busy timeout
pub fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::DatabaseBusy || e.code == ErrorCode::DatabaseLocked
    )
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rusqlite_is_persistence() {
        let err = from_rusqlite(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert_eq!(err.op(), Some("sqlite"));
    }

    #[test]
    fn test_from_rusqlite_classifies_busy_and_constraints() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(from_rusqlite(busy).kind(), ExErrorKind::LockTimeout);

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (n INTEGER CHECK (n > 0));")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (0)", []).unwrap_err();
        assert_eq!(from_rusqlite(err).kind(), ExErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_migration_error_keeps_sqlite_source() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute_batch("CREATE TABLE (").unwrap_err();

        let ex = migration_error("003_broken", err);
        assert_eq!(ex.kind(), ExErrorKind::Persistence);
        assert!(ex.message().contains("003_broken"));
        let source = ex.source_error().unwrap();
        assert_eq!(source.op(), Some("sqlite"));
        assert!(std::error::Error::source(&ex).is_some());
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('x');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('x')", []).unwrap_err();
        assert!(is_unique_violation(&err, "t.k"));
        assert!(!is_unique_violation(&err, "other.k"));
        assert!(!is_busy(&err));
    }
}
