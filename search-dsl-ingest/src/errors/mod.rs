//! Error types for the search DSL ingest.

use search_dsl_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while feeding records into the index.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The record source failed to produce a batch.
    #[error("Source error: {0}")]
    SourceError(String),

    /// A record could not be turned into a document.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

impl IngestError {
    /// Create a source error.
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
