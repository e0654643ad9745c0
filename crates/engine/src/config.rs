//! `open`'s configuration document.
//!
//! A database is opened from a small JSON document rather than a builder
//! or a file on disk: `{"engine": "memory"}` is valid on its own, `path`
//! and `cache` are accepted but presently unused by the only backend this
//! crate ships (`memory`) — they exist so a future persistent-local or
//! remote backend can be selected by the same document without changing
//! the `open` signature.

use serde::Deserialize;
use ukv_core::error::{Error, Result};

/// The set of backend names this crate knows how to open.
pub const SUPPORTED_ENGINES: &[&str] = &["memory"];

/// Parsed form of the JSON document passed to `open`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Backend selector. Only `"memory"` is implemented by this crate.
    pub engine: String,
    /// Backend-specific storage location. Ignored by the memory backend.
    #[serde(default)]
    pub path: Option<String>,
    /// Backend-specific cache budget in bytes. Ignored by the memory backend.
    #[serde(default)]
    pub cache: Option<u64>,
}

impl EngineConfig {
    /// Parse and validate a config document.
    ///
    /// Rejects malformed JSON and any `engine` value this crate cannot
    /// open, both as [`Error::Usage`] — an unopenable backend is a caller
    /// mistake, not a runtime fault.
    pub fn parse(config_json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(config_json)
            .map_err(|e| Error::Usage(format!("invalid config_json: {e}")))?;
        if !SUPPORTED_ENGINES.contains(&config.engine.as_str()) {
            return Err(Error::Usage(format!(
                "unknown engine '{}': supported engines are {:?}",
                config.engine, SUPPORTED_ENGINES
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_parses() {
        let config = EngineConfig::parse(r#"{"engine": "memory"}"#).unwrap();
        assert_eq!(config.engine, "memory");
        assert_eq!(config.path, None);
        assert_eq!(config.cache, None);
    }

    #[test]
    fn path_and_cache_are_accepted() {
        let config = EngineConfig::parse(r#"{"engine": "memory", "path": "/tmp/db", "cache": 4096}"#).unwrap();
        assert_eq!(config.path.as_deref(), Some("/tmp/db"));
        assert_eq!(config.cache, Some(4096));
    }

    #[test]
    fn unknown_engine_is_a_usage_error() {
        let err = EngineConfig::parse(r#"{"engine": "rocksdb"}"#).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn malformed_json_is_a_usage_error() {
        let err = EngineConfig::parse("not json").unwrap_err();
        assert_eq!(err.kind(), "usage");
    }

    #[test]
    fn missing_engine_field_is_a_usage_error() {
        let err = EngineConfig::parse(r#"{"path": "/tmp/db"}"#).unwrap_err();
        assert_eq!(err.kind(), "usage");
    }
}
