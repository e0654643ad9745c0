//! The UKV public surface: opaque, reference-counted handles over the
//! batch data-plane in `ukv-engine`.
//!
//! - [`Db`] is the substrate: an opened store and the literal
//!   `write`/`read`/`scan`/`size`/`control` batch operations.
//! - [`Collection`] and [`Txn`] are the facade: single-key convenience
//!   methods that desugar to one-task calls against [`Db`].
//!
//! All three are cheap to clone or hold onto past the handle the caller
//! first named them with — each wraps an `Arc` to the same underlying
//! store, so a `Db` dropped while a `Collection` or `Txn` is still alive
//! simply keeps the store alive until the last of them is dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collection;
mod db;
mod txn;

pub use collection::Collection;
pub use db::Db;
pub use txn::Txn;

pub use ukv_core::error::{Error, Result};
pub use ukv_core::traits::SizeEstimate;
pub use ukv_core::{
    CollectionId, CommitPoint, Key, Options, DEFAULT_COLLECTION, MISSING_VALUE_LENGTH, UNKNOWN_KEY,
};
pub use ukv_engine::{Arena, ReadOutcome, ReadTape, ScanTape, ScanTask, SizeRange, Strided, TxnId, TxnStatus};
