//! UKV: a transactional, batch-oriented key-value engine.
//!
//! This crate is a thin umbrella over the workspace's layered crates:
//!
//! - [`ukv_core`] — shared types, sentinels, and the `Backend` trait.
//! - [`ukv_storage`] — the reference in-memory backend and collection registry.
//! - [`ukv_concurrency`] — the OCC transaction manager.
//! - [`ukv_engine`] — the `Database` facade: arenas, strided decoding, batch ops.
//! - [`ukv_api`] — the public opaque-handle surface.
//!
//! Most callers only need [`ukv_api`], re-exported here at the crate root.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use ukv_api::*;

pub use ukv_core::error::{Error, Result};
