//! `Database`: the engine facade wiring the collection registry, a
//! storage backend, and the transaction pool into the batch data-plane
//! and control channel.

use std::sync::Arc;

use ukv_core::error::{Error, Result};
use ukv_core::traits::{Backend, SizeEstimate};
use ukv_core::{
    CollectionId, CommitPoint, Key, Options, Write, DEFAULT_COLLECTION, MAX_BATCH_TASKS,
    MAX_COLLECTION_NAME_LEN, MAX_VALUE_LEN,
};
use ukv_storage::{CollectionRegistry, MemoryBackend};

use crate::arena::{Arena, ReadTape, ScanTape};
use crate::config::EngineConfig;
use crate::decoder::{decode_optional, Strided};
use crate::txn_pool::{TxnId, TxnPool};

/// One scan task: up to `scan_length` ascending, present keys `>= min_key`
/// within `collection`.
#[derive(Debug, Clone, Copy)]
pub struct ScanTask {
    /// Collection to scan.
    pub collection: CollectionId,
    /// Lower bound, inclusive.
    pub min_key: Key,
    /// Maximum number of results to return.
    pub scan_length: usize,
}

/// One size-estimation task: bounds for `[min_key, max_key]` in `collection`.
#[derive(Debug, Clone, Copy)]
pub struct SizeRange {
    /// Collection to estimate.
    pub collection: CollectionId,
    /// Lower bound, inclusive.
    pub min_key: Key,
    /// Upper bound, inclusive.
    pub max_key: Key,
}

/// Result of a batch read: either the full value tape, or — when
/// `options` requests [`Options::READ_LENGTHS_ONLY`] — just the lengths,
/// with no value bytes ever copied into the arena.
pub enum ReadOutcome<'a> {
    /// Lengths and value bytes, laid out in `arena`.
    Full(ReadTape<'a>),
    /// Lengths only; [`ukv_core::MISSING_VALUE_LENGTH`] marks an absent key.
    LengthsOnly(Vec<u32>),
}

/// An opened store: a storage backend, its collection registry, and a
/// pool of live transactions.
pub struct Database {
    backend: Arc<dyn Backend>,
    registry: CollectionRegistry,
    txns: TxnPool,
}

impl Database {
    /// Parse `config_json` and open the named backend.
    ///
    /// Only `{"engine": "memory"}` (plus the ignored `path`/`cache`
    /// fields) is implemented by this crate; see [`EngineConfig`].
    pub fn open(config_json: &str) -> Result<Arc<Self>> {
        let config = EngineConfig::parse(config_json)?;
        let backend: Arc<dyn Backend> = match config.engine.as_str() {
            "memory" => Arc::new(MemoryBackend::new()),
            other => return Err(Error::Usage(format!("unknown engine '{other}'"))),
        };
        Ok(Arc::new(Database {
            backend,
            registry: CollectionRegistry::new(),
            txns: TxnPool::new(),
        }))
    }

    /// Open (creating if necessary) the collection named `name`; `None`
    /// selects the always-present default collection.
    pub fn collection_open(&self, name: Option<&str>) -> Result<CollectionId> {
        if let Some(name) = name {
            if name.len() > MAX_COLLECTION_NAME_LEN {
                return Err(Error::Usage(format!(
                    "collection name is {} bytes, exceeding the {MAX_COLLECTION_NAME_LEN}-byte limit",
                    name.len()
                )));
            }
        }
        let id = self.registry.open(name);
        self.backend.ensure_collection(id)?;
        Ok(id)
    }

    /// All named collections, in creation order. The default collection
    /// is never included.
    pub fn collection_list(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Remove a collection. `None` clears the default collection's keys
    /// while preserving its id; `Some(name)` drops both the id and its
    /// contents.
    pub fn collection_remove(&self, name: Option<&str>) -> Result<()> {
        match name {
            None => self.backend.clear_collection(DEFAULT_COLLECTION),
            Some(name) => {
                let id = self
                    .registry
                    .remove(name)
                    .ok_or_else(|| Error::NotFound(format!("no collection named '{name}'")))?;
                self.backend.drop_collection(id)
            }
        }
    }

    /// Begin (or reset for reuse) a transaction.
    ///
    /// `requested_gen == 0` asks the engine to assign a fresh generation.
    /// [`Options::TXN_SNAPSHOT`] captures a consistent read point at this
    /// call; [`Options::READ_TRACK`] turns on OCC read-set recording for
    /// every read this transaction performs.
    pub fn txn_begin(&self, requested_gen: TxnId, options: Options) -> Result<TxnId> {
        let snapshot = if options.has(Options::TXN_SNAPSHOT) {
            Some(self.backend.snapshot()?)
        } else {
            None
        };
        let read_track = options.has(Options::READ_TRACK);
        self.txns.begin(requested_gen, snapshot, read_track)
    }

    /// Validate and, if valid, atomically apply `txn`'s writes.
    pub fn txn_commit(&self, txn: TxnId) -> Result<CommitPoint> {
        self.txns.commit(txn, self.backend.as_ref())
    }

    /// Release a transaction's buffers and snapshot. A handle with no
    /// live transaction is a no-op.
    pub fn txn_free(&self, txn: TxnId) {
        self.txns.free(txn);
    }

    /// Current lifecycle status of a transaction handle, if it is live.
    pub fn txn_status(&self, txn: TxnId) -> Option<ukv_concurrency::TxnStatus> {
        self.txns.status(txn)
    }

    /// Batch write: set or delete `(collection[i], key[i])` for each of
    /// `tasks_count` tasks.
    ///
    /// `collections` defaults to the default collection for every task
    /// when absent. `values` defaults to deleting every task's key when
    /// absent; a per-task `None` deletes that task's key specifically.
    /// Buffered in `txn`'s write-set if given, otherwise applied
    /// atomically against the live store.
    #[cfg_attr(feature = "perf-trace", tracing::instrument(skip(self, collections, values), fields(tasks_count)))]
    pub fn write(
        &self,
        txn: Option<TxnId>,
        tasks_count: usize,
        collections: Option<Strided<'_, CollectionId>>,
        keys: &[Key],
        values: Option<Strided<'_, Option<&[u8]>>>,
        options: Options,
    ) -> Result<()> {
        if tasks_count > MAX_BATCH_TASKS {
            return Err(Error::Usage(format!(
                "batch of {tasks_count} tasks exceeds the {MAX_BATCH_TASKS}-task limit"
            )));
        }
        if keys.len() != tasks_count {
            return Err(Error::Usage(format!(
                "expected {tasks_count} keys, got {}",
                keys.len()
            )));
        }
        let collections = decode_optional(collections, tasks_count, DEFAULT_COLLECTION)?;
        let values = match values {
            Some(strided) => strided.decode(tasks_count, true)?,
            None => vec![None; tasks_count],
        };
        for value in values.iter().flatten() {
            if value.len() as u64 > MAX_VALUE_LEN {
                return Err(Error::Usage(format!(
                    "value is {} bytes, exceeding the {MAX_VALUE_LEN}-byte limit",
                    value.len()
                )));
            }
        }

        let writes: Vec<Write> = (0..tasks_count)
            .map(|i| Write {
                collection: collections[i],
                key: keys[i],
                value: values[i].map(|v| v.to_vec()),
            })
            .collect();

        match txn {
            Some(gen) => self.txns.with_txn(gen, |ctx| {
                for w in &writes {
                    ctx.write(w.collection, w.key, w.value.clone());
                }
                Ok(())
            }),
            None => {
                self.backend.apply_batch(&writes)?;
                if options.has(Options::WRITE_FLUSH) {
                    self.backend.flush()?;
                }
                Ok(())
            }
        }
    }

    /// Batch read of `keys.len()` tasks.
    ///
    /// Inside a transaction, reads are read-your-writes: the write-set is
    /// consulted first, then the transaction's snapshot (if any), then
    /// the live store. [`Options::READ_LENGTHS_ONLY`] skips copying value
    /// bytes into `arena` entirely.
    #[cfg_attr(feature = "perf-trace", tracing::instrument(skip(self, arena, collections)))]
    pub fn read(
        &self,
        txn: Option<TxnId>,
        arena: &mut Arena,
        collections: Option<Strided<'_, CollectionId>>,
        keys: &[Key],
        options: Options,
    ) -> Result<ReadOutcome<'_>> {
        let tasks_count = keys.len();
        if tasks_count > MAX_BATCH_TASKS {
            return Err(Error::Usage(format!(
                "batch of {tasks_count} tasks exceeds the {MAX_BATCH_TASKS}-task limit"
            )));
        }
        let collections = decode_optional(collections, tasks_count, DEFAULT_COLLECTION)?;

        let mut values: Vec<Option<Vec<u8>>> = Vec::with_capacity(tasks_count);
        for i in 0..tasks_count {
            let value = match txn {
                Some(gen) => self
                    .txns
                    .with_txn(gen, |ctx| ctx.read(self.backend.as_ref(), collections[i], keys[i]))?,
                None => self.backend.point_get(collections[i], keys[i])?.map(|e| e.value),
            };
            values.push(value);
        }

        if options.has(Options::READ_LENGTHS_ONLY) {
            let lengths = values
                .iter()
                .map(|v| v.as_ref().map(|b| b.len() as u32).unwrap_or(ukv_core::MISSING_VALUE_LENGTH))
                .collect();
            Ok(ReadOutcome::LengthsOnly(lengths))
        } else {
            Ok(ReadOutcome::Full(arena.build_read_tape(&values)))
        }
    }

    /// Batch scan: for each task, up to `scan_length` ascending present
    /// keys `>= min_key`, with their value lengths.
    pub fn scan(&self, txn: Option<TxnId>, arena: &mut Arena, tasks: &[ScanTask]) -> Result<ScanTape<'_>> {
        if tasks.len() > MAX_BATCH_TASKS {
            return Err(Error::Usage(format!(
                "batch of {} scan tasks exceeds the {MAX_BATCH_TASKS}-task limit",
                tasks.len()
            )));
        }
        let mut per_task: Vec<Vec<(Key, u32)>> = Vec::with_capacity(tasks.len());
        for task in tasks {
            let rows: Vec<(Key, Vec<u8>)> = match txn {
                Some(gen) => self
                    .txns
                    .with_txn(gen, |ctx| ctx.scan(self.backend.as_ref(), task.collection, task.min_key, task.scan_length))?,
                None => self.backend.range_scan(task.collection, task.min_key, task.scan_length)?,
            };
            per_task.push(rows.into_iter().map(|(k, v)| (k, v.len() as u32)).collect());
        }
        Ok(arena.build_scan_tape(&per_task, true))
    }

    /// Loose size estimate for each of `ranges`.
    pub fn size(&self, ranges: &[SizeRange]) -> Result<Vec<SizeEstimate>> {
        ranges
            .iter()
            .map(|r| self.backend.estimate_size(r.collection, r.min_key, r.max_key))
            .collect()
    }

    /// Run a control-channel command: `clear`, `reset`, `compact`,
    /// `info`, or `usage`.
    pub fn control(&self, request: &str) -> Result<String> {
        match request {
            "clear" => {
                self.backend.clear_all()?;
                Ok("ok".to_string())
            }
            "reset" => {
                self.backend.clear_all()?;
                for name in self.registry.list() {
                    if let Some(id) = self.registry.remove(&name) {
                        self.backend.drop_collection(id)?;
                    }
                }
                Ok("ok".to_string())
            }
            "compact" => {
                self.backend.compact()?;
                Ok("ok".to_string())
            }
            "info" => Ok(self.backend.info()),
            "usage" => {
                let usage = self.backend.usage()?;
                Ok(format!(
                    "keys={} value_bytes={} ram_bytes={} disk_bytes={}",
                    usage.keys, usage.value_bytes, usage.ram_bytes, usage.disk_bytes
                ))
            }
            other => Err(Error::Usage(format!("unrecognized control command '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_unknown_engine() {
        let err = Database::open(r#"{"engine": "rocksdb"}"#).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn scenario_a_mixed_hit_and_miss_in_one_batch() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.write(None, 2, None, &[1, 2], Some(Strided::Each(&[Some(&b"a"[..]), Some(&b"bb"[..])])), Options::none())
            .unwrap();

        let mut arena = Arena::new();
        let outcome = db.read(None, &mut arena, None, &[1, 2, 3], Options::none()).unwrap();
        let ReadOutcome::Full(tape) = outcome else { panic!("expected full tape") };
        assert_eq!(tape.value_at(0), Some(&b"a"[..]));
        assert_eq!(tape.value_at(1), Some(&b"bb"[..]));
        assert_eq!(tape.value_at(2), None);
    }

    #[test]
    fn scenario_b_removing_a_named_collection_invalidates_reads() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let users = db.collection_open(Some("users")).unwrap();
        db.write(None, 1, Some(Strided::Broadcast(users)), &[7], Some(Strided::Broadcast(Some(&b"x"[..]))), Options::none())
            .unwrap();
        assert!(db.collection_list().contains(&"users".to_string()));

        db.collection_remove(Some("users")).unwrap();
        assert!(!db.collection_list().contains(&"users".to_string()));

        let mut arena = Arena::new();
        let outcome = db
            .read(None, &mut arena, Some(Strided::Broadcast(users)), &[7], Options::none())
            .unwrap();
        let ReadOutcome::Full(tape) = outcome else { panic!("expected full tape") };
        assert_eq!(tape.value_at(0), None);
    }

    #[test]
    fn scenario_d_snapshot_txn_is_unaffected_by_concurrent_commits() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.write(None, 1, None, &[10], Some(Strided::Broadcast(Some(&b"a"[..]))), Options::none())
            .unwrap();

        let txn = db.txn_begin(0, Options::from_bits(Options::TXN_SNAPSHOT).unwrap()).unwrap();

        db.write(None, 1, None, &[10], Some(Strided::Broadcast(Some(&b"b"[..]))), Options::none())
            .unwrap();

        let mut arena = Arena::new();
        let outcome = db.read(Some(txn), &mut arena, None, &[10], Options::none()).unwrap();
        let ReadOutcome::Full(tape) = outcome else { panic!("expected full tape") };
        assert_eq!(tape.value_at(0), Some(&b"a"[..]));
    }

    #[test]
    fn scenario_e_broadcast_null_values_deletes_every_key() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let keys: Vec<Key> = (0..10).collect();
        let values: Vec<Option<&[u8]>> = vec![Some(&b"v"[..]); 10];
        db.write(None, 10, None, &keys, Some(Strided::Each(&values)), Options::none()).unwrap();

        db.write(None, 10, None, &keys, None, Options::none()).unwrap();

        let mut arena = Arena::new();
        let outcome = db.read(None, &mut arena, None, &keys, Options::none()).unwrap();
        let ReadOutcome::Full(tape) = outcome else { panic!("expected full tape") };
        for i in 0..10 {
            assert_eq!(tape.value_at(i), None);
        }
    }

    #[test]
    fn scenario_f_scan_returns_ascending_bounded_results() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let keys = [2i64, 5, 9, 11];
        let values: Vec<Option<&[u8]>> = vec![Some(&b"v"[..]); 4];
        db.write(None, 4, None, &keys, Some(Strided::Each(&values)), Options::none()).unwrap();

        let mut arena = Arena::new();
        let tape = db
            .scan(None, &mut arena, &[ScanTask { collection: DEFAULT_COLLECTION, min_key: 0, scan_length: 3 }])
            .unwrap();
        assert_eq!(tape.keys_for(0), vec![2, 5, 9]);
    }

    #[test]
    fn broadcast_stride_writes_same_value_to_every_key() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let keys = [1i64, 2, 3];
        db.write(None, 3, None, &keys, Some(Strided::Broadcast(Some(&b"same"[..]))), Options::none())
            .unwrap();

        let mut arena = Arena::new();
        let outcome = db.read(None, &mut arena, None, &keys, Options::none()).unwrap();
        let ReadOutcome::Full(tape) = outcome else { panic!("expected full tape") };
        for i in 0..3 {
            assert_eq!(tape.value_at(i), Some(&b"same"[..]));
        }
    }

    #[test]
    fn read_lengths_only_never_produces_value_bytes() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.write(None, 1, None, &[1], Some(Strided::Broadcast(Some(&b"abc"[..]))), Options::none())
            .unwrap();

        let mut arena = Arena::new();
        let opts = Options::from_bits(Options::READ_LENGTHS_ONLY).unwrap();
        let outcome = db.read(None, &mut arena, None, &[1, 2], opts).unwrap();
        let ReadOutcome::LengthsOnly(lengths) = outcome else { panic!("expected lengths only") };
        assert_eq!(lengths[0], 3);
        assert_eq!(lengths[1], ukv_core::MISSING_VALUE_LENGTH);
    }

    #[test]
    fn control_usage_reports_live_key_count() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.write(None, 2, None, &[1, 2], Some(Strided::Each(&[Some(&b"a"[..]), Some(&b"bb"[..])])), Options::none())
            .unwrap();
        let report = db.control("usage").unwrap();
        assert!(report.contains("keys=2"));
    }

    #[test]
    fn control_clear_preserves_collection_names() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.collection_open(Some("users")).unwrap();
        db.control("clear").unwrap();
        assert!(db.collection_list().contains(&"users".to_string()));
    }

    #[test]
    fn control_reset_drops_named_collections_too() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        db.collection_open(Some("users")).unwrap();
        db.control("reset").unwrap();
        assert!(db.collection_list().is_empty());
    }

    #[test]
    fn control_rejects_unknown_command() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let err = db.control("vacuum").unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn write_task_count_mismatch_is_a_usage_error() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let err = db.write(None, 3, None, &[1, 2], None, Options::none()).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn collection_name_over_the_limit_is_a_usage_error() {
        let db = Database::open(r#"{"engine": "memory"}"#).unwrap();
        let long_name = "x".repeat(ukv_core::MAX_COLLECTION_NAME_LEN + 1);
        let err = db.collection_open(Some(&long_name)).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }
}
