//! Typed error hierarchy for confsearch.
//!
//! - `ConfigError` - loading and parsing `confsearch.toml`
//! - `SearchError` - failures inside the search pipeline
//!
//! Prompt packing itself has no error type; it always produces a prompt.

use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from a single search request.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Index query failed: {0}")]
    Index(#[source] anyhow::Error),

    #[error("Completion failed: {0}")]
    Completion(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SearchError {
    /// Whether the caller sent something unusable, as opposed to a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::InvalidQuery(_))
    }
}
