//! Transaction handle lifecycle: `begin` / `commit` / `free` and handle
//! reuse, layered over [`ukv_concurrency::TransactionManager`].
//!
//! The pool owns the mapping from a generation number (the handle) to its
//! [`TransactionContext`]. Concurrency semantics (OCC validation, snapshot
//! isolation) live entirely in `ukv-concurrency`; this module is purely
//! about handle identity and reuse.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use ukv_concurrency::{TransactionContext, TransactionManager, TxnStatus};
use ukv_core::error::{Error, Result};
use ukv_core::traits::SnapshotView;
use ukv_core::{Backend, CommitPoint};

/// A transaction handle: the generation number it was begun with.
pub type TxnId = u64;

/// Owns every live transaction context and the OCC commit protocol.
pub struct TxnPool {
    manager: TransactionManager,
    next_auto_gen: AtomicU64,
    live: DashMap<TxnId, Mutex<TransactionContext>>,
}

impl TxnPool {
    /// An empty pool.
    pub fn new() -> Self {
        TxnPool {
            manager: TransactionManager::new(),
            next_auto_gen: AtomicU64::new(0),
            live: DashMap::new(),
        }
    }

    /// Begin (or reset for reuse) a transaction.
    ///
    /// `requested_gen == 0` asks the engine to assign a fresh generation.
    /// A nonzero value currently bound to an [`TxnStatus::Active`]
    /// transaction is rejected: that generation identifies a transaction
    /// still in progress. Any other nonzero value — unused, or bound to a
    /// committed/conflicted transaction — is accepted and (re)starts that
    /// handle at `Active`, discarding its previous buffers.
    pub fn begin(
        &self,
        requested_gen: TxnId,
        snapshot: Option<Arc<dyn SnapshotView>>,
        read_track: bool,
    ) -> Result<TxnId> {
        let gen = if requested_gen == 0 {
            loop {
                let candidate = self.next_auto_gen.fetch_add(1, Ordering::SeqCst) + 1;
                if !self.live.contains_key(&candidate) {
                    break candidate;
                }
            }
        } else {
            requested_gen
        };

        match self.live.entry(gen) {
            Entry::Occupied(mut slot) => {
                let mut ctx = slot.get_mut().lock();
                if ctx.status() == TxnStatus::Active {
                    return Err(Error::Usage(format!(
                        "generation {gen} already names an active transaction"
                    )));
                }
                *ctx = TransactionContext::begin(gen, snapshot, read_track);
            }
            Entry::Vacant(slot) => {
                slot.insert(Mutex::new(TransactionContext::begin(gen, snapshot, read_track)));
            }
        }

        Ok(gen)
    }

    /// Run `f` against the live context for `gen`.
    pub fn with_txn<R>(&self, gen: TxnId, f: impl FnOnce(&mut TransactionContext) -> Result<R>) -> Result<R> {
        let slot = self
            .live
            .get(&gen)
            .ok_or_else(|| Error::NotFound(format!("no live transaction with generation {gen}")))?;
        let mut ctx = slot.lock();
        f(&mut ctx)
    }

    /// Validate and, if valid, atomically apply `gen`'s writes.
    pub fn commit(&self, gen: TxnId, backend: &dyn Backend) -> Result<CommitPoint> {
        let slot = self
            .live
            .get(&gen)
            .ok_or_else(|| Error::NotFound(format!("no live transaction with generation {gen}")))?;
        let mut ctx = slot.lock();
        self.manager.commit(&mut ctx, backend)
    }

    /// Release a transaction's buffers and snapshot. A `gen` with no live
    /// handle is a no-op, matching the null-handle-free convention used
    /// throughout the public surface.
    pub fn free(&self, gen: TxnId) {
        self.live.remove(&gen);
    }

    /// Current status of a live handle, if any.
    pub fn status(&self, gen: TxnId) -> Option<TxnStatus> {
        self.live.get(&gen).map(|slot| slot.lock().status())
    }
}

impl Default for TxnPool {
    fn default() -> Self {
        Self::new()
    }
}
