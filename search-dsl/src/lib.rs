//! # Search DSL
//!
//! Chainable, immutable search criteria for Elasticsearch and OpenSearch,
//! compiled to the engine's query DSL, plus response decoding, scrolling,
//! multi-search and bulk indexing.
//!
//! This crate wires the pieces together from environment configuration and
//! re-exports the types callers work with.

pub mod config;
pub mod telemetry;

pub use config::{Dependencies, LogFormat, Settings};
pub use telemetry::init_tracing;

pub use search_dsl_ingest::{
    IndexDocument, Indexer, IndexerConfig, IngestError, PageLoader, PagedSource, RecordSource,
    VecSource,
};
pub use search_dsl_repository::{
    Aggregation, Bulk, BulkOptions, Connection, ConnectionConfig, OpenSearchTransport, Response,
    Scroll, ScrollCursor, SearchError, Transport,
};
pub use search_dsl_shared::{
    Clause, Criteria, Dialect, FieldFilter, IndexDefinition, IndexTarget, SortField, SortOrder,
};

use thiserror::Error;

/// Errors that can occur while setting up or using the search DSL.
#[derive(Error, Debug)]
pub enum SearchDslError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl SearchDslError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
