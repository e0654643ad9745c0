//! `TransactionContext`: the private state of one transaction.
//!
//! A context buffers writes (last-write-wins within the transaction),
//! optionally pins a snapshot, and optionally tracks every key it reads for
//! OCC validation at commit. Reads are always read-your-writes: the
//! write-set is consulted before falling back to the snapshot or the live
//! backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use ukv_core::error::Result;
use ukv_core::traits::SnapshotView;
use ukv_core::{Backend, CollectionId, CommitPoint, Key, Write};

/// Where a transaction currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Accepting reads and writes.
    Active,
    /// Committed; writes are visible to later readers.
    Committed,
    /// Commit lost the OCC race. Buffers are preserved for retry/logging
    /// until the handle is freed or reused via a fresh `begin`.
    Conflicted,
}

/// The private read/write state of one transaction.
pub struct TransactionContext {
    /// The generation number this context was last `begin`'d with.
    pub generation: u64,
    status: TxnStatus,
    snapshot: Option<Arc<dyn SnapshotView>>,
    read_track: bool,
    write_set: HashMap<(CollectionId, Key), Option<Vec<u8>>>,
    read_set: HashMap<(CollectionId, Key), CommitPoint>,
}

impl TransactionContext {
    /// Start (or restart, for handle reuse) a transaction at `generation`.
    ///
    /// `snapshot`, if provided, pins every read for the lifetime of this
    /// context to that view. `read_track` turns on read-set recording for
    /// OCC validation at commit.
    pub fn begin(generation: u64, snapshot: Option<Arc<dyn SnapshotView>>, read_track: bool) -> Self {
        TransactionContext {
            generation,
            status: TxnStatus::Active,
            snapshot,
            read_track,
            write_set: HashMap::new(),
            read_set: HashMap::new(),
        }
    }

    /// Current state-machine status.
    pub fn status(&self) -> TxnStatus {
        self.status
    }

    /// Whether this context has no buffered writes.
    ///
    /// A read-only transaction never needs to enter the commit protocol's
    /// write-applying phase, even if it commits successfully.
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }

    /// Buffer a write. Last write to a given `(collection, key)` within the
    /// same transaction wins; nothing is visible outside the transaction
    /// until commit.
    pub fn write(&mut self, collection: CollectionId, key: Key, value: Option<Vec<u8>>) {
        self.write_set.insert((collection, key), value);
    }

    /// Read a key: write-set first (read-your-writes), then the pinned
    /// snapshot if one exists, then the live backend. Records a read-set
    /// entry when read-tracking is enabled and the read fell through to
    /// the snapshot/backend.
    pub fn read(
        &mut self,
        backend: &dyn Backend,
        collection: CollectionId,
        key: Key,
    ) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.write_set.get(&(collection, key)) {
            return Ok(buffered.clone());
        }

        let (value, commit_point) = match &self.snapshot {
            Some(snap) => match snap.get(collection, key)? {
                Some(entry) => (Some(entry.value), entry.commit_point),
                None => (None, 0),
            },
            None => match backend.point_get(collection, key)? {
                Some(entry) => (Some(entry.value), entry.commit_point),
                None => (None, 0),
            },
        };

        if self.read_track {
            self.read_set.insert((collection, key), commit_point);
        }

        Ok(value)
    }

    /// Ascending scan merging the write-set over the snapshot/backend view,
    /// `keys >= min_key`, at most `limit` present results.
    ///
    /// Read-tracking does not apply to scans: OCC validation here is a
    /// per-key, point-read concern only.
    pub fn scan(
        &self,
        backend: &dyn Backend,
        collection: CollectionId,
        min_key: Key,
        limit: usize,
    ) -> Result<Vec<(Key, Vec<u8>)>> {
        let local_overrides: Vec<_> = self
            .write_set
            .iter()
            .filter(|((c, k), _)| *c == collection && *k >= min_key)
            .collect();

        // Fetch enough base rows to still satisfy `limit` after local
        // deletes are applied: widen the request by the number of local
        // deletes below min_key + limit, looping if a delete pushes the
        // window further out. Bounded to a handful of rounds; this backend
        // is a reference implementation, not a performance target.
        let mut fetch_limit = limit + local_overrides.len();
        let mut merged: BTreeMap<Key, Vec<u8>> = BTreeMap::new();
        for _round in 0..4 {
            let base = match &self.snapshot {
                Some(snap) => snap.scan(collection, min_key, fetch_limit)?,
                None => backend.range_scan(collection, min_key, fetch_limit)?,
            };
            let base_len = base.len();
            merged = base.into_iter().map(|(k, e)| (k, e.value)).collect();
            for (k, v) in &local_overrides {
                let (_, key) = k;
                match v {
                    Some(val) => {
                        merged.insert(*key, val.clone());
                    }
                    None => {
                        merged.remove(key);
                    }
                }
            }
            if merged.len() >= limit || base_len < fetch_limit {
                break;
            }
            fetch_limit *= 2;
        }

        Ok(merged.into_iter().take(limit).collect())
    }

    /// Materialize the write-set as a batch for the backend's atomic apply.
    pub(crate) fn writes(&self) -> Vec<Write> {
        self.write_set
            .iter()
            .map(|(&(collection, key), value)| Write {
                collection,
                key,
                value: value.clone(),
            })
            .collect()
    }

    pub(crate) fn mark_committed(&mut self) {
        self.status = TxnStatus::Committed;
    }

    pub(crate) fn mark_conflicted(&mut self) {
        self.status = TxnStatus::Conflicted;
    }

    /// Read-set entries recorded so far (for tests/diagnostics).
    pub fn read_set(&self) -> impl Iterator<Item = (&(CollectionId, Key), &CommitPoint)> {
        self.read_set.iter()
    }
}
