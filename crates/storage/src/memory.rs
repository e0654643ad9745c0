//! `MemoryBackend`: the reference in-process implementation of [`Backend`].
//!
//! Shards by collection (DashMap keyed by `CollectionId`, `RwLock<BTreeMap<..>>`
//! inside): unrelated collections never contend, and each collection's key
//! space is kept in sorted order for range scans.
//!
//! This backend keeps every version of every key forever once written, so
//! `control("compact")` only ever prunes keys whose entire version chain
//! is tombstones; it never folds or discards live history.

use crate::registry::CollectionRegistry;
use crate::version_chain::VersionChain;
use dashmap::mapref::entry::Entry as DashEntry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use ukv_core::error::Result;
use ukv_core::traits::{BackendUsage, Entry, SizeEstimate, SnapshotView};
use ukv_core::{Backend, CollectionId, CommitPoint, Key, Write};

type Shard = RwLock<BTreeMap<Key, VersionChain>>;

struct Inner {
    collections: DashMap<CollectionId, Shard>,
    commit_point: AtomicU64,
}

impl Inner {
    fn shard(&self, collection: CollectionId) -> dashmap::mapref::one::Ref<'_, CollectionId, Shard> {
        if let Some(shard) = self.collections.get(&collection) {
            return shard;
        }
        self.collections.entry(collection).or_insert_with(|| RwLock::new(BTreeMap::new()));
        self.collections.get(&collection).expect("just inserted")
    }
}

/// An in-process, in-memory [`Backend`]. This is the reference/default
/// backend selected by `engine: "memory"` in `open`'s config.
///
/// The name <-> id mapping is a separate component
/// ([`crate::registry::CollectionRegistry`]) owned by `ukv-engine`'s
/// `Database`, not by the backend: the backend only ever sees opaque
/// `CollectionId`s.
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// A fresh, empty backend.
    pub fn new() -> Self {
        MemoryBackend {
            inner: Arc::new(Inner {
                collections: DashMap::new(),
                commit_point: AtomicU64::new(0),
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn point_get(&self, collection: CollectionId, key: Key) -> Result<Option<Entry>> {
        let shard = self.inner.shard(collection);
        let map = shard.read();
        Ok(map.get(&key).and_then(|chain| {
            chain.latest().map(|value| Entry {
                value: value.to_vec(),
                commit_point: chain.latest_commit_point().unwrap_or(0),
            })
        }))
    }

    fn range_scan(&self, collection: CollectionId, min_key: Key, limit: usize) -> Result<Vec<(Key, Entry)>> {
        let shard = self.inner.shard(collection);
        let map = shard.read();
        let mut out = Vec::new();
        for (key, chain) in map.range(min_key..) {
            if out.len() >= limit {
                break;
            }
            if let Some(value) = chain.latest() {
                out.push((
                    *key,
                    Entry {
                        value: value.to_vec(),
                        commit_point: chain.latest_commit_point().unwrap_or(0),
                    },
                ));
            }
        }
        Ok(out)
    }

    fn apply_batch(&self, batch: &[Write]) -> Result<CommitPoint> {
        if batch.is_empty() {
            return Ok(self.inner.commit_point.load(Ordering::SeqCst));
        }

        let mut collections: Vec<CollectionId> = batch.iter().map(|w| w.collection).collect();
        collections.sort_unstable_by_key(|c| c.as_u64());
        collections.dedup();

        // Acquire every involved collection's write lock, in a fixed global
        // order, before touching any of them: this is what makes the batch
        // atomic (no intermediate state visible to a concurrent reader) and
        // deadlock-free with respect to other overlapping batches.
        let shards: Vec<_> = collections.iter().map(|c| self.inner.shard(*c)).collect();
        let mut guards: Vec<_> = shards.iter().map(|s| s.write()).collect();

        let commit_point = self.inner.commit_point.fetch_add(1, Ordering::SeqCst) + 1;

        for write in batch {
            let idx = collections
                .binary_search(&write.collection)
                .expect("collection was registered above");
            let chain = guards[idx].entry(write.key).or_insert_with(VersionChain::new);
            chain.push(commit_point, write.value.clone());
        }

        Ok(commit_point)
    }

    fn estimate_size(&self, collection: CollectionId, min_key: Key, max_key: Key) -> Result<SizeEstimate> {
        let shard = self.inner.shard(collection);
        let map = shard.read();
        let mut cardinality = 0u64;
        let mut value_bytes = 0u64;
        for (_, chain) in map.range(min_key..=max_key) {
            if let Some(value) = chain.latest() {
                cardinality += 1;
                value_bytes += value.len() as u64;
            }
        }
        // Exact answers from a BTreeMap are still a valid loose estimate:
        // callers are only ever promised min <= true_value <= max.
        Ok(SizeEstimate {
            min_cardinality: cardinality,
            max_cardinality: cardinality,
            min_value_bytes: value_bytes,
            max_value_bytes: value_bytes,
            min_memory_bytes: value_bytes,
            max_memory_bytes: value_bytes,
        })
    }

    fn current_commit_point(&self) -> CommitPoint {
        self.inner.commit_point.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Result<Arc<dyn SnapshotView>> {
        Ok(Arc::new(MemorySnapshot {
            inner: Arc::clone(&self.inner),
            at: self.inner.commit_point.load(Ordering::SeqCst),
        }))
    }

    fn ensure_collection(&self, collection: CollectionId) -> Result<()> {
        self.inner
            .collections
            .entry(collection)
            .or_insert_with(|| RwLock::new(BTreeMap::new()));
        Ok(())
    }

    fn clear_collection(&self, collection: CollectionId) -> Result<()> {
        if let DashEntry::Occupied(entry) = self.inner.collections.entry(collection) {
            entry.get().write().clear();
        }
        Ok(())
    }

    fn drop_collection(&self, collection: CollectionId) -> Result<()> {
        self.inner.collections.remove(&collection);
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        for shard in self.inner.collections.iter() {
            shard.write().clear();
        }
        Ok(())
    }

    /// This backend keeps full history forever for snapshot reads, so
    /// compaction here is limited to dropping keys whose entire version
    /// chain is tombstones: they carry no live value and nothing older
    /// than any snapshot still pins them meaningfully. A real persistent
    /// backend would additionally fold each chain down to the oldest
    /// version any live snapshot still needs.
    fn compact(&self) -> Result<()> {
        let mut reclaimed = 0u64;
        for shard in self.inner.collections.iter() {
            let mut map = shard.write();
            let dead: Vec<Key> = map
                .iter()
                .filter(|(_, chain)| chain.is_all_tombstones())
                .map(|(k, _)| *k)
                .collect();
            for key in dead {
                map.remove(&key);
                reclaimed += 1;
            }
        }
        tracing::debug!(reclaimed, "compact: dropped all-tombstone keys");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn usage(&self) -> Result<BackendUsage> {
        let mut keys = 0u64;
        let mut value_bytes = 0u64;
        for shard in self.inner.collections.iter() {
            for (_, chain) in shard.read().iter() {
                if let Some(value) = chain.latest() {
                    keys += 1;
                    value_bytes += value.len() as u64;
                }
            }
        }
        Ok(BackendUsage {
            keys,
            value_bytes,
            ram_bytes: value_bytes,
            disk_bytes: 0,
        })
    }

    fn info(&self) -> String {
        format!(
            "ukv-storage memory backend; collections={}; commit_point={}",
            self.inner.collections.len(),
            self.current_commit_point()
        )
    }
}

/// A read view of a [`MemoryBackend`] pinned at a fixed commit point.
struct MemorySnapshot {
    inner: Arc<Inner>,
    at: CommitPoint,
}

impl SnapshotView for MemorySnapshot {
    fn get(&self, collection: CollectionId, key: Key) -> Result<Option<Entry>> {
        let shard = self.inner.shard(collection);
        let map = shard.read();
        Ok(map.get(&key).and_then(|chain| {
            chain.at(self.at).map(|(commit_point, value)| Entry {
                value: value.to_vec(),
                commit_point,
            })
        }))
    }

    fn scan(&self, collection: CollectionId, min_key: Key, limit: usize) -> Result<Vec<(Key, Entry)>> {
        let shard = self.inner.shard(collection);
        let map = shard.read();
        let mut out = Vec::new();
        for (key, chain) in map.range(min_key..) {
            if out.len() >= limit {
                break;
            }
            if let Some((commit_point, value)) = chain.at(self.at) {
                out.push((*key, Entry { value: value.to_vec(), commit_point }));
            }
        }
        Ok(out)
    }

    fn commit_point(&self) -> CommitPoint {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(collection: CollectionId, key: Key, value: Option<&[u8]>) -> Write {
        Write {
            collection,
            key,
            value: value.map(|v| v.to_vec()),
        }
    }

    #[test]
    fn round_trip_get_after_put() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 1, Some(b"a"))]).unwrap();
        let entry = backend.point_get(col, 1).unwrap().unwrap();
        assert_eq!(entry.value, b"a");
    }

    #[test]
    fn delete_removes_visibility_but_not_history() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 1, Some(b"a"))]).unwrap();
        backend.apply_batch(&[w(col, 1, None)]).unwrap();
        assert!(backend.point_get(col, 1).unwrap().is_none());
    }

    #[test]
    fn batch_across_collections_is_atomic_at_the_storage_level() {
        let backend = MemoryBackend::new();
        let a = CollectionId::new(0);
        let b = CollectionId::new(1);
        let cp = backend
            .apply_batch(&[w(a, 1, Some(b"x")), w(b, 1, Some(b"y"))])
            .unwrap();
        assert_eq!(backend.point_get(a, 1).unwrap().unwrap().commit_point, cp);
        assert_eq!(backend.point_get(b, 1).unwrap().unwrap().commit_point, cp);
    }

    #[test]
    fn scan_returns_ascending_present_keys_up_to_limit() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        for k in [2, 5, 9, 11] {
            backend.apply_batch(&[w(col, k, Some(b"v"))]).unwrap();
        }
        let got: Vec<Key> = backend
            .range_scan(col, 0, 3)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(got, vec![2, 5, 9]);
    }

    #[test]
    fn compact_drops_keys_that_were_only_ever_deleted() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 1, None)]).unwrap();
        backend.apply_batch(&[w(col, 2, Some(b"v"))]).unwrap();
        backend.compact().unwrap();
        assert!(backend.point_get(col, 1).unwrap().is_none());
        assert_eq!(backend.point_get(col, 2).unwrap().unwrap().value, b"v");
    }

    #[test]
    fn compact_preserves_a_key_deleted_after_having_a_value() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 1, Some(b"a"))]).unwrap();
        let snap = backend.snapshot().unwrap();
        backend.apply_batch(&[w(col, 1, None)]).unwrap();
        backend.compact().unwrap();
        assert_eq!(snap.get(col, 1).unwrap().unwrap().value, b"a");
    }

    #[test]
    fn snapshot_is_unaffected_by_later_commits() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 10, Some(b"a"))]).unwrap();
        let snap = backend.snapshot().unwrap();
        backend.apply_batch(&[w(col, 10, Some(b"b"))]).unwrap();
        assert_eq!(snap.get(col, 10).unwrap().unwrap().value, b"a");
        assert_eq!(backend.point_get(col, 10).unwrap().unwrap().value, b"b");
    }

    #[test]
    fn estimate_size_bounds_are_exact_for_this_backend() {
        let backend = MemoryBackend::new();
        let col = CollectionId::new(0);
        backend.apply_batch(&[w(col, 1, Some(b"ab")), w(col, 2, Some(b"cd"))]).unwrap();
        let size = backend.estimate_size(col, 0, 10).unwrap();
        assert_eq!(size.min_cardinality, 2);
        assert_eq!(size.max_cardinality, 2);
        assert_eq!(size.min_value_bytes, 4);
    }

    use proptest::prelude::*;
    use std::collections::BTreeMap as StdBTreeMap;

    proptest! {
        /// Round-trip + delete, against an arbitrary sequence of
        /// put/delete operations on a handful of keys: the backend's
        /// final view of each key always matches a plain `BTreeMap`
        /// replayed through the same operations in order.
        #[test]
        fn point_get_matches_sequential_replay(
            ops in prop::collection::vec(
                (0i64..16, prop::option::of(prop::collection::vec(any::<u8>(), 0..8))),
                0..64,
            )
        ) {
            let backend = MemoryBackend::new();
            let col = CollectionId::new(0);
            let mut model: StdBTreeMap<Key, Option<Vec<u8>>> = StdBTreeMap::new();

            for (key, value) in ops {
                backend.apply_batch(&[w(col, key, value.as_deref())]).unwrap();
                model.insert(key, value);
            }

            for (key, expected) in &model {
                let got = backend.point_get(col, *key).unwrap().map(|e| e.value);
                prop_assert_eq!(&got, expected);
            }
        }

        /// Scan order and bound: `range_scan(min, limit)` never returns
        /// more than `limit` keys, every key returned is `>= min`, and
        /// the keys are strictly ascending.
        #[test]
        fn scan_is_bounded_ascending_and_at_least_min(
            keys in prop::collection::hash_set(0i64..200, 0..40),
            min_key in 0i64..200,
            limit in 0usize..20,
        ) {
            let backend = MemoryBackend::new();
            let col = CollectionId::new(0);
            for k in &keys {
                backend.apply_batch(&[w(col, *k, Some(b"v"))]).unwrap();
            }

            let got: Vec<Key> = backend
                .range_scan(col, min_key, limit)
                .unwrap()
                .into_iter()
                .map(|(k, _)| k)
                .collect();

            prop_assert!(got.len() <= limit);
            prop_assert!(got.iter().all(|&k| k >= min_key));
            prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
        }

        /// Size bounds: the loose estimate always brackets the count of
        /// live keys actually present in the requested range.
        #[test]
        fn size_estimate_brackets_true_cardinality(
            keys in prop::collection::hash_set(0i64..100, 0..30),
            min_key in 0i64..100,
            max_key in 0i64..100,
        ) {
            let backend = MemoryBackend::new();
            let col = CollectionId::new(0);
            for k in &keys {
                backend.apply_batch(&[w(col, *k, Some(b"v"))]).unwrap();
            }
            let (lo, hi) = if min_key <= max_key { (min_key, max_key) } else { (max_key, min_key) };
            let true_count = keys.iter().filter(|&&k| k >= lo && k <= hi).count() as u64;

            let size = backend.estimate_size(col, lo, hi).unwrap();
            prop_assert!(size.min_cardinality <= true_count);
            prop_assert!(true_count <= size.max_cardinality);
        }
    }
}
