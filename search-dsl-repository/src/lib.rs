//! # Search DSL Repository
//!
//! This crate turns criteria into engine requests and engine responses into
//! decoded results. It includes the error types, the `Transport` seam with an
//! OpenSearch implementation, the request compiler, response and aggregation
//! decoding, bulk batching, scrolling and multi-search.

pub mod bulk;
pub mod config;
pub mod connection;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod response;
pub mod scroll;

#[cfg(test)]
pub(crate) mod testing;

pub use bulk::{Bulk, BulkAction, BulkOptions, BulkSummary};
pub use config::ConnectionConfig;
pub use connection::Connection;
pub use errors::{BulkItemError, SearchError};
pub use interfaces::{HttpMethod, RequestBody, Transport, TransportRequest};
pub use opensearch::{compile, OpenSearchTransport};
pub use response::{Aggregation, AggregationNode, Bucket, Response};
pub use scroll::{Scroll, ScrollCursor, ScrollState};
