//! OpenSearch wire support.
//!
//! This module provides the request body compiler and a concrete
//! `Transport` implementation backed by the `opensearch` crate.

mod client;
mod queries;

pub use client::OpenSearchTransport;
pub use queries::{build_aggregations, build_filter_fragment, build_post_filter, build_query, compile};
