//! Interface definitions for the search engine transport.
//!
//! This module defines the abstract `Transport` trait that allows for
//! dependency injection and swappable HTTP backends.

mod transport;

pub use transport::{HttpMethod, RequestBody, Transport, TransportRequest};
