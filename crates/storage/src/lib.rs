//! Reference in-memory backend and collection registry for the UKV engine.
//!
//! [`MemoryBackend`] implements `ukv_core::Backend` over a sharded,
//! versioned `BTreeMap` per collection; [`CollectionRegistry`] maps
//! collection names to ids. Both are wired together by `ukv-engine`'s
//! `Database`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod registry;
pub mod version_chain;

pub use memory::MemoryBackend;
pub use registry::CollectionRegistry;
pub use version_chain::VersionChain;
