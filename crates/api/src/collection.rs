//! `Collection`: single-key convenience over the batch data-plane,
//! scoped to one collection and auto-committing outside a transaction.
//!
//! Desugars to the batch data-plane: `get`/`put`/`delete`/`scan` are each
//! a one-task call to [`ukv_engine::Database::read`]/`write`/`scan`.

use std::sync::Arc;

use ukv_core::error::Result;
use ukv_core::traits::SizeEstimate;
use ukv_core::{CollectionId, Key, Options};
use ukv_engine::{Arena, Database, ReadOutcome, ScanTask, SizeRange, Strided};

/// A handle scoped to one collection within a [`crate::Db`].
pub struct Collection {
    db: Arc<Database>,
    id: CollectionId,
    arena: Arena,
}

impl Collection {
    pub(crate) fn new(db: Arc<Database>, id: CollectionId) -> Self {
        Collection {
            db,
            id,
            arena: Arena::new(),
        }
    }

    /// This collection's stable numeric id.
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Set `key` to `value`, outside any transaction.
    pub fn put(&self, key: Key, value: &[u8]) -> Result<()> {
        self.db.write(
            None,
            1,
            Some(Strided::Broadcast(self.id)),
            &[key],
            Some(Strided::Broadcast(Some(value))),
            Options::none(),
        )
    }

    /// Delete `key`, outside any transaction.
    pub fn delete(&self, key: Key) -> Result<()> {
        self.db.write(
            None,
            1,
            Some(Strided::Broadcast(self.id)),
            &[key],
            Some(Strided::Broadcast(None)),
            Options::none(),
        )
    }

    /// Read `key`'s current value, or `None` if absent.
    ///
    /// Takes `&mut self`: the returned bytes are copied out before this
    /// call returns, so the borrow never outlives it.
    pub fn get(&mut self, key: Key) -> Result<Option<Vec<u8>>> {
        let outcome = self.db.read(
            None,
            &mut self.arena,
            Some(Strided::Broadcast(self.id)),
            &[key],
            Options::none(),
        )?;
        let ReadOutcome::Full(tape) = outcome else {
            unreachable!("Collection::get never sets READ_LENGTHS_ONLY")
        };
        Ok(tape.value_at(0).map(|bytes| bytes.to_vec()))
    }

    /// Ascending, present keys `>= min_key`, at most `limit` of them.
    pub fn scan(&mut self, min_key: Key, limit: usize) -> Result<Vec<Key>> {
        let tape = self.db.scan(
            None,
            &mut self.arena,
            &[ScanTask {
                collection: self.id,
                min_key,
                scan_length: limit,
            }],
        )?;
        Ok(tape.keys_for(0))
    }

    /// Loose size estimate for `[min_key, max_key]` in this collection.
    pub fn size(&self, min_key: Key, max_key: Key) -> Result<SizeEstimate> {
        let mut estimates = self.db.size(&[SizeRange {
            collection: self.id,
            min_key,
            max_key,
        }])?;
        Ok(estimates.remove(0))
    }
}
