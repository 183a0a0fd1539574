//! Named in-process locks with bounded waits
//!
//! A lock is identified by a string key (`snapshot:<id>`, `program:<id>`).
//! Holding a [`LockGuard`] excludes every other holder of the same key;
//! waiters give up after the table's timeout with `LockTimeout`.
//!
//! Callers needing both a program and a snapshot lock must take the program
//! lock first.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use snapline_core::errors::{ExResult, SnapshotError};

pub fn snapshot_key(snapshot_id: &str) -> String {
    format!("snapshot:{}", snapshot_id)
}

pub fn program_key(program_id: &str) -> String {
    format!("program:{}", program_id)
}

#[derive(Debug)]
pub struct LockTable {
    held: Mutex<HashSet<String>>,
    released: Condvar,
    timeout: Duration,
}

/// Releases its key on drop and wakes waiters
#[derive(Debug)]
pub struct LockGuard<'a> {
    table: &'a LockTable,
    key: String,
}

impl LockTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire `key`, waiting at most the table's timeout
    ///
    /// # Errors
    ///
    /// `LockTimeout` if the key is still held when the wait expires.
    pub fn acquire(&self, key: impl Into<String>) -> ExResult<LockGuard<'_>> {
        let key = key.into();
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held();

        while held.contains(&key) {
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(resource = %key, "lock wait expired");
                return Err(SnapshotError::LockTimeout {
                    resource: key,
                    waited_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
                .into());
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }

        held.insert(key.clone());
        Ok(LockGuard { table: self, key })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held().contains(key)
    }
}

impl LockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.table.held().remove(&self.key);
        self.table.released.notify_all();
    }
}
