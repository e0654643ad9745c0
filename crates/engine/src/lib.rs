//! The UKV engine facade: a collection registry, a storage backend, and
//! a transaction pool wired into one batch data-plane.
//!
//! - [`arena`]: the caller-reused scratch buffer and the value-tape
//!   layout returned from reads and scans.
//! - [`decoder`]: the strided argument abstraction (one value per task,
//!   or one value broadcast to every task).
//! - [`config`]: parsing and validating `open`'s JSON config document.
//! - [`txn_pool`]: transaction handle identity, reuse, and the OCC commit
//!   protocol (delegated to `ukv-concurrency`).
//! - [`database`]: [`database::Database`], the facade tying the above
//!   together into `write`/`read`/`scan`/`size` and the control channel.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod config;
pub mod database;
pub mod decoder;
pub mod txn_pool;

pub use arena::{Arena, ReadTape, ScanTape};
pub use config::EngineConfig;
pub use database::{Database, ReadOutcome, ScanTask, SizeRange};
pub use decoder::Strided;
pub use txn_pool::TxnId;
pub use ukv_concurrency::TxnStatus;
