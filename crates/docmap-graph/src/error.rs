//! Engine error types.
//!
//! Layout, diffing, search and animation never fail - bad input degrades to a
//! best-effort diagram. Errors only come from the ambient edges of the crate:
//! loading settings and importing/exporting the position cache.

use thiserror::Error;

/// Errors raised by settings loading and position-store persistence.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings YAML did not parse.
    #[error("invalid settings yaml: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Settings parsed but a value is out of range.
    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    /// Position-store document did not (de)serialize.
    #[error("position store format error: {0}")]
    StoreFormat(#[from] serde_json::Error),

    /// Position-store document was written by an incompatible version.
    #[error("unsupported position store version {found} (expected {expected})")]
    UnsupportedStoreVersion { found: u32, expected: u32 },
}

impl GraphError {
    /// Check if the caller can carry on with defaults / an empty cache.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GraphError::StoreFormat(_) | GraphError::UnsupportedStoreVersion { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
