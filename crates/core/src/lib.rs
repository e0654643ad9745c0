//! Foundational types and traits for the UKV engine.
//!
//! This crate defines the vocabulary shared by every layer above it:
//!
//! - [`types`]: `CollectionId`, `Key`, the global sentinels, and the
//!   per-call `Options` bitmask.
//! - [`limits`]: size limits enforced at the boundary between callers and
//!   the engine.
//! - [`error`]: the unified `Error`/`Result` type.
//! - [`traits`]: the `Backend`/`SnapshotView` capability surface every
//!   storage implementation must provide.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use limits::{MAX_BATCH_TASKS, MAX_COLLECTION_NAME_LEN, MAX_VALUE_LEN};
pub use traits::{Backend, BackendUsage, Entry, SizeEstimate, SnapshotView, Write};
pub use types::{
    CollectionId, CommitPoint, Key, Options, DEFAULT_COLLECTION, MISSING_VALUE_LENGTH, UNKNOWN_KEY,
};
