//! Error types for the UKV engine.
//!
//! [`Error`] is the single error type returned by every fallible operation
//! in the engine, from the strided argument decoder up through the public
//! API. Each variant corresponds to one of the error kinds named in the
//! contract: `usage`, `not_found`, `exists`, `conflict`, `out_of_memory`,
//! `io`, `unsupported`, `corruption`.

use thiserror::Error;

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all UKV operations.
///
/// Variant names mirror the error kinds of the public contract so that a
/// caller (or a binding layer) can map `Error` to a stable string without
/// inspecting the message text.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad arguments: null required base, zero stride on a required
    /// non-broadcastable argument, an unrecognized option bit, or similar.
    #[error("usage error: {0}")]
    Usage(String),

    /// A named collection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reserved for future use (e.g. CREATE-only collection open semantics).
    #[error("already exists: {0}")]
    Exists(String),

    /// A transaction's commit lost the optimistic-concurrency race.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The engine or backend could not allocate memory for the request.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The backend failed a persistence operation.
    #[error("I/O error: {0}")]
    Io(String),

    /// The backend does not support the requested capability (e.g. snapshots).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An invariant was found violated while reading committed state.
    ///
    /// Corruption is fatal for the owning `Db` handle: subsequent calls on
    /// that handle may continue to return this error.
    #[error("corruption detected: {0}")]
    Corruption(String),
}

impl Error {
    /// Short machine-readable kind name, stable across message-text changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Usage(_) => "usage",
            Error::NotFound(_) => "not_found",
            Error::Exists(_) => "exists",
            Error::Conflict(_) => "conflict",
            Error::OutOfMemory(_) => "out_of_memory",
            Error::Io(_) => "io",
            Error::Unsupported(_) => "unsupported",
            Error::Corruption(_) => "corruption",
        }
    }

    /// Whether a transaction that failed with this error is safe to retry
    /// by beginning a fresh transaction and replaying its operations.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Error::Usage("x".into()).kind(), "usage");
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::Conflict("x".into()).kind(), "conflict");
        assert_eq!(Error::Corruption("x".into()).kind(), "corruption");
    }

    #[test]
    fn is_conflict_only_for_conflict_variant() {
        assert!(Error::Conflict("retry me".into()).is_conflict());
        assert!(!Error::Usage("bad arg".into()).is_conflict());
        assert!(!Error::Io("disk full".into()).is_conflict());
    }

    #[test]
    fn display_includes_message() {
        let err = Error::NotFound("users".into());
        assert!(err.to_string().contains("users"));
    }
}
