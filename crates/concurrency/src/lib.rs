//! Transaction manager for the UKV engine: OCC validation, snapshot
//! isolation, and read-set tracking.
//!
//! [`TransactionContext`] is the private state of one transaction;
//! [`TransactionManager`] allocates generation numbers and runs the
//! validate-then-apply commit protocol.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::TransactionManager;
pub use transaction::{TransactionContext, TxnStatus};
