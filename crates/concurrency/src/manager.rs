//! `TransactionManager`: generation allocation and OCC commit.
//!
//! Commit protocol:
//!
//! 1. Acquire the global commit lock (prevents a TOCTOU race between
//!    validating the read-set and applying the write-set).
//! 2. Validate: for every tracked read, check that the backend's current
//!    commit point for that key still matches what was observed.
//! 3. On conflict: mark the transaction `Conflicted`, return
//!    [`ukv_core::Error::Conflict`] without touching storage.
//! 4. On success: apply the write-set as one atomic batch, mark the
//!    transaction `Committed`.
//!
//! Blind writes (a write without a corresponding tracked read) never
//! conflict — only the read-set is validated. This allows write-skew
//! when a caller doesn't track the reads its writes logically depend on.

use crate::transaction::TransactionContext;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use ukv_core::error::{Error, Result};
use ukv_core::{Backend, CommitPoint};

/// Coordinates generation allocation and atomic, validated commits.
pub struct TransactionManager {
    next_generation: AtomicU64,
    /// Serializes the validate-then-apply sequence across all
    /// transactions on this manager. A single lock is sufficient for one
    /// backend; a deployment with many independent collections could
    /// instead shard this lock per collection the way the write path
    /// already does inside `MemoryBackend::apply_batch`.
    commit_lock: Mutex<()>,
}

impl TransactionManager {
    /// A fresh manager with generation allocation starting at 1.
    pub fn new() -> Self {
        TransactionManager {
            next_generation: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
        }
    }

    /// Allocate the next engine-assigned generation number (used when a
    /// caller passes `gen == 0` to `begin`).
    pub fn allocate_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Validate and, if valid, atomically apply a transaction's writes.
    pub fn commit(&self, txn: &mut TransactionContext, backend: &dyn Backend) -> Result<CommitPoint> {
        let _guard = self.commit_lock.lock();

        for (&(collection, key), &observed) in txn.read_set() {
            let current = backend.point_get(collection, key)?;
            let current_point = current.map(|e| e.commit_point).unwrap_or(0);
            if current_point != observed {
                txn.mark_conflicted();
                return Err(Error::Conflict(format!(
                    "read-set entry for key {key} in collection {} invalidated: read at commit point {observed}, now at {current_point}",
                    collection.as_u64()
                )));
            }
        }

        if txn.is_read_only() {
            txn.mark_committed();
            return Ok(backend.current_commit_point());
        }

        let batch = txn.writes();
        let commit_point = backend.apply_batch(&batch)?;
        txn.mark_committed();
        Ok(commit_point)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
