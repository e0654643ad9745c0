//! The storage backend capability surface.
//!
//! Everything above this trait — the transaction manager, the batch
//! data-plane, the collection registry — is written against `Backend` and
//! `SnapshotView` only. A backend is free to be in-memory, persistent-local,
//! or remote; this crate ships the in-memory reference implementation in
//! `ukv-storage`.

use crate::error::Result;
use crate::types::{CollectionId, CommitPoint, Key};
use std::sync::Arc;

/// A single value together with the commit point that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored bytes.
    pub value: Vec<u8>,
    /// The commit point at which this value became visible.
    pub commit_point: CommitPoint,
}

/// One write task: set `(collection, key)` to `value`, or delete it if
/// `value` is `None`.
#[derive(Debug, Clone)]
pub struct Write {
    /// Target collection.
    pub collection: CollectionId,
    /// Target key.
    pub key: Key,
    /// New value, or `None` to delete the key.
    pub value: Option<Vec<u8>>,
}

/// Loose six-number size estimate for a key range.
///
/// The only invariant a caller may rely on is `min <= true_value <= max`
/// for each pair; a backend that can only produce exact answers (like the
/// in-memory reference backend) simply sets `min == max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeEstimate {
    /// Lower bound on the number of keys in range.
    pub min_cardinality: u64,
    /// Upper bound on the number of keys in range.
    pub max_cardinality: u64,
    /// Lower bound on total value bytes in range.
    pub min_value_bytes: u64,
    /// Upper bound on total value bytes in range.
    pub max_value_bytes: u64,
    /// Lower bound on persistent memory usage attributable to the range.
    pub min_memory_bytes: u64,
    /// Upper bound on persistent memory usage attributable to the range.
    pub max_memory_bytes: u64,
}

/// A read view pinned at a fixed commit point, unaffected by later commits.
pub trait SnapshotView: Send + Sync {
    /// Point lookup as of this snapshot's commit point.
    fn get(&self, collection: CollectionId, key: Key) -> Result<Option<Entry>>;

    /// Ascending range scan as of this snapshot's commit point, `keys >= min_key`.
    fn scan(&self, collection: CollectionId, min_key: Key, limit: usize) -> Result<Vec<(Key, Entry)>>;

    /// The commit point this snapshot is pinned to.
    fn commit_point(&self) -> CommitPoint;
}

/// The capability set every storage backend must provide.
///
/// Thread safety: every method must be safe to call concurrently from
/// multiple threads (`Send + Sync`); the backend owns its own internal
/// synchronization.
pub trait Backend: Send + Sync {
    /// Point lookup of the latest committed value.
    fn point_get(&self, collection: CollectionId, key: Key) -> Result<Option<Entry>>;

    /// Ascending range scan of the latest committed state, `keys >= min_key`,
    /// at most `limit` results.
    fn range_scan(&self, collection: CollectionId, min_key: Key, limit: usize) -> Result<Vec<(Key, Entry)>>;

    /// Apply a batch of writes atomically, assigning them a single new
    /// commit point. Either every write in `batch` becomes visible, or
    /// none do.
    fn apply_batch(&self, batch: &[Write]) -> Result<CommitPoint>;

    /// Loose cardinality/byte/memory estimate for a key range.
    fn estimate_size(&self, collection: CollectionId, min_key: Key, max_key: Key) -> Result<SizeEstimate>;

    /// The highest commit point assigned so far.
    fn current_commit_point(&self) -> CommitPoint;

    /// Capture a read view pinned at the current commit point.
    ///
    /// Returns [`crate::error::Error::Unsupported`] for backends that
    /// cannot offer snapshot isolation.
    fn snapshot(&self) -> Result<Arc<dyn SnapshotView>>;

    /// Ensure `collection` exists with an empty key space if it is new.
    fn ensure_collection(&self, collection: CollectionId) -> Result<()>;

    /// Delete all keys in `collection`, preserving the id.
    fn clear_collection(&self, collection: CollectionId) -> Result<()>;

    /// Delete `collection` and all of its keys.
    fn drop_collection(&self, collection: CollectionId) -> Result<()>;

    /// Delete all data in every collection; collection ids are preserved.
    fn clear_all(&self) -> Result<()>;

    /// Request a background compaction pass. Advisory; backends without a
    /// compaction concept may treat this as a no-op.
    fn compact(&self) -> Result<()>;

    /// Force durable persistence of everything committed so far.
    ///
    /// Backends without a persistence layer may treat this as a no-op:
    /// durability otherwise follows the backend's own default policy.
    fn flush(&self) -> Result<()>;

    /// Approximate totals across the whole backend, for `control("usage")`.
    fn usage(&self) -> Result<BackendUsage>;

    /// A short diagnostic string for `control("info")`: backend name and
    /// any version/build information it wants to surface.
    fn info(&self) -> String;
}

/// Approximate whole-backend sizing, reported by the `usage` control command.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendUsage {
    /// Total number of live keys across all collections.
    pub keys: u64,
    /// Total value bytes across all collections.
    pub value_bytes: u64,
    /// Approximate resident memory used by the backend.
    pub ram_bytes: u64,
    /// Approximate persistent (on-disk) footprint; 0 for purely in-memory backends.
    pub disk_bytes: u64,
}
