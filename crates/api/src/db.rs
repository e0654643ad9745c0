//! `Db`: the opened-store handle and the literal batch data-plane,
//! mirroring `open`/`write`/`read`/`scan`/`size`/`control` one-to-one.
//!
//! This is the "substrate" layer: thin, exactly as powerful as
//! `ukv-engine::Database`, and the thing [`crate::Collection`] and
//! [`crate::Txn`] desugar down to for their single-key convenience
//! methods.

use std::sync::Arc;

use ukv_core::error::Result;
use ukv_core::{CollectionId, Key, Options, DEFAULT_COLLECTION};
use ukv_engine::{Arena, Database, ReadOutcome, ScanTape, ScanTask, SizeRange, Strided};
use ukv_core::traits::SizeEstimate;

use crate::collection::Collection;
use crate::txn::Txn;

/// An opened store.
///
/// Cloning is cheap (an `Arc` clone) and every clone refers to the same
/// underlying [`Database`]; [`Collection`]s and [`Txn`]s hold their own
/// clone too, so a `Db` dropped while dependents are still alive simply
/// keeps the store alive until the last dependent is dropped — it cannot
/// crash, only outlive the variable the caller happened to name it with.
#[derive(Clone)]
pub struct Db {
    inner: Arc<Database>,
}

impl Db {
    /// Parse `config_json` and open the named backend. See
    /// [`ukv_engine::EngineConfig`] for the document shape.
    pub fn open(config_json: &str) -> Result<Self> {
        Ok(Db {
            inner: Database::open(config_json)?,
        })
    }

    /// The reserved id of the default, unnamed collection.
    pub fn default_collection(&self) -> CollectionId {
        DEFAULT_COLLECTION
    }

    /// Open (creating if necessary) the collection named `name`, and
    /// return a handle scoped to it. `None` opens the default collection.
    pub fn collection(&self, name: Option<&str>) -> Result<Collection> {
        let id = self.inner.collection_open(name)?;
        Ok(Collection::new(Arc::clone(&self.inner), id))
    }

    /// All named collections, in creation order.
    pub fn collection_list(&self) -> Vec<String> {
        self.inner.collection_list()
    }

    /// Remove a collection by name, or clear the default collection's
    /// keys (preserving its id) if `name` is `None`.
    pub fn collection_remove(&self, name: Option<&str>) -> Result<()> {
        self.inner.collection_remove(name)
    }

    /// Begin a transaction, letting the engine assign its generation.
    pub fn begin(&self, options: Options) -> Result<Txn> {
        let id = self.inner.txn_begin(0, options)?;
        Ok(Txn::new(Arc::clone(&self.inner), id))
    }

    /// Begin a transaction under a caller-chosen generation number.
    ///
    /// Rejected if that generation currently names an active
    /// transaction; any other value restarts that handle for reuse.
    pub fn begin_with_generation(&self, generation: u64, options: Options) -> Result<Txn> {
        let id = self.inner.txn_begin(generation, options)?;
        Ok(Txn::new(Arc::clone(&self.inner), id))
    }

    /// Batch write: set or delete `(collections[i], keys[i])` for each
    /// task. See [`ukv_engine::Database::write`].
    pub fn write(
        &self,
        txn: Option<&Txn>,
        tasks_count: usize,
        collections: Option<Strided<'_, CollectionId>>,
        keys: &[Key],
        values: Option<Strided<'_, Option<&[u8]>>>,
        options: Options,
    ) -> Result<()> {
        self.inner
            .write(txn.map(Txn::id), tasks_count, collections, keys, values, options)
    }

    /// Batch read. See [`ukv_engine::Database::read`].
    pub fn read<'a>(
        &self,
        txn: Option<&Txn>,
        arena: &'a mut Arena,
        collections: Option<Strided<'_, CollectionId>>,
        keys: &[Key],
        options: Options,
    ) -> Result<ReadOutcome<'a>> {
        self.inner.read(txn.map(Txn::id), arena, collections, keys, options)
    }

    /// Batch scan. See [`ukv_engine::Database::scan`].
    pub fn scan<'a>(&self, txn: Option<&Txn>, arena: &'a mut Arena, tasks: &[ScanTask]) -> Result<ScanTape<'a>> {
        self.inner.scan(txn.map(Txn::id), arena, tasks)
    }

    /// Batch size estimation. See [`ukv_engine::Database::size`].
    pub fn size(&self, ranges: &[SizeRange]) -> Result<Vec<SizeEstimate>> {
        self.inner.size(ranges)
    }

    /// Run a control-channel command: `clear`, `reset`, `compact`,
    /// `info`, or `usage`.
    pub fn control(&self, request: &str) -> Result<String> {
        self.inner.control(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_with_unknown_engine_is_a_usage_error() {
        let err = Db::open(r#"{"engine": "rocksdb"}"#).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn default_collection_is_opened_implicitly() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        assert!(db.collection_list().is_empty());
        assert_eq!(db.default_collection(), DEFAULT_COLLECTION);
    }

    #[test]
    fn cloning_db_shares_the_same_store() {
        let db = Db::open(r#"{"engine": "memory"}"#).unwrap();
        let collection = db.collection(Some("users")).unwrap();
        let other = db.clone();
        assert!(other.collection_list().contains(&"users".to_string()));
        drop(collection);
    }
}
