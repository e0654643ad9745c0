//! `Txn`: a live transaction handle with single-key convenience methods.
//!
//! Buffers are released automatically on drop — the engine's "passing a
//! null handle to `*_free` is a no-op" rule becomes, in Rust, "dropping
//! an already-committed or already-freed `Txn` is always safe": `Drop`
//! calls the same idempotent free the explicit API would.

use std::sync::Arc;

use ukv_core::error::Result;
use ukv_core::{CollectionId, CommitPoint, Key, Options};
use ukv_engine::{Arena, Database, ReadOutcome, ScanTask, Strided, TxnId, TxnStatus};

/// A transaction in progress (or already committed/conflicted, pending
/// either retry via [`crate::Db::begin_with_generation`] or drop).
pub struct Txn {
    db: Arc<Database>,
    id: TxnId,
    arena: Arena,
}

impl Txn {
    pub(crate) fn new(db: Arc<Database>, id: TxnId) -> Self {
        Txn {
            db,
            id,
            arena: Arena::new(),
        }
    }

    /// This transaction's generation number.
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Current lifecycle status.
    pub fn status(&self) -> Option<TxnStatus> {
        self.db.txn_status(self.id)
    }

    /// Buffer a write in this transaction's write-set. Last write to a
    /// given key wins; nothing is visible outside the transaction until
    /// [`Self::commit`].
    pub fn put(&self, collection: CollectionId, key: Key, value: &[u8]) -> Result<()> {
        self.db.write(
            Some(self.id),
            1,
            Some(Strided::Broadcast(collection)),
            &[key],
            Some(Strided::Broadcast(Some(value))),
            Options::none(),
        )
    }

    /// Buffer a delete in this transaction's write-set.
    pub fn delete(&self, collection: CollectionId, key: Key) -> Result<()> {
        self.db.write(
            Some(self.id),
            1,
            Some(Strided::Broadcast(collection)),
            &[key],
            Some(Strided::Broadcast(None)),
            Options::none(),
        )
    }

    /// Read `key`, read-your-writes: the write-set is consulted before
    /// falling back to this transaction's snapshot (if any) or the live
    /// store. Pass [`Options::READ_TRACK`] at [`crate::Db::begin`] to
    /// have this read validated for conflicts at commit.
    pub fn get(&mut self, collection: CollectionId, key: Key) -> Result<Option<Vec<u8>>> {
        let outcome = self.db.read(
            Some(self.id),
            &mut self.arena,
            Some(Strided::Broadcast(collection)),
            &[key],
            Options::none(),
        )?;
        let ReadOutcome::Full(tape) = outcome else {
            unreachable!("Txn::get never sets READ_LENGTHS_ONLY")
        };
        Ok(tape.value_at(0).map(|bytes| bytes.to_vec()))
    }

    /// Ascending, present keys `>= min_key` within `collection`, merging
    /// this transaction's buffered writes over the base store.
    pub fn scan(&mut self, collection: CollectionId, min_key: Key, limit: usize) -> Result<Vec<Key>> {
        let tape = self.db.scan(
            Some(self.id),
            &mut self.arena,
            &[ScanTask {
                collection,
                min_key,
                scan_length: limit,
            }],
        )?;
        Ok(tape.keys_for(0))
    }

    /// Validate and, if valid, atomically apply this transaction's
    /// writes. On an OCC conflict, returns [`ukv_core::error::Error::Conflict`]
    /// and leaves the transaction in [`TxnStatus::Conflicted`] — its
    /// buffers are preserved for retry or logging until it is dropped or
    /// its generation is reused via [`crate::Db::begin_with_generation`].
    pub fn commit(&self) -> Result<CommitPoint> {
        self.db.txn_commit(self.id)
    }
}

impl Drop for Txn {
    fn drop(&mut self) {
        self.db.txn_free(self.id);
    }
}

#[cfg(test)]
mod tests {
    use crate::Db;
    use ukv_core::Options;

    #[test]
    fn read_your_writes_within_a_transaction() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        let mut txn = db.begin(Options::none()).unwrap();
        let users = db.collection(None).unwrap().id();
        txn.put(users, 1, b"buffered").unwrap();
        assert_eq!(txn.get(users, 1).unwrap(), Some(b"buffered".to_vec()));
    }

    #[test]
    fn occ_conflict_on_tracked_read_invalidated_by_concurrent_commit() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        let default = db.default_collection();

        let opts = Options::from_bits(Options::READ_TRACK).unwrap();
        let mut t1 = db.begin(opts).unwrap();
        assert_eq!(t1.get(default, 5).unwrap(), None);

        let t2 = db.begin(Options::none()).unwrap();
        t2.put(default, 5, b"from-t2").unwrap();
        t2.commit().unwrap();

        let err = t1.commit().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(t1.status(), Some(ukv_engine::TxnStatus::Conflicted));
    }

    #[test]
    fn dropping_a_committed_transaction_is_safe() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        let txn = db.begin(Options::none()).unwrap();
        txn.commit().unwrap();
        drop(txn);
    }

    #[test]
    fn begin_with_generation_allows_explicit_reuse_after_commit() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        let txn = db.begin_with_generation(9, Options::none()).unwrap();
        assert_eq!(txn.id(), 9);
        txn.commit().unwrap();
        drop(txn);

        let again = db.begin_with_generation(9, Options::none()).unwrap();
        assert_eq!(again.status(), Some(ukv_engine::TxnStatus::Active));
    }
}
