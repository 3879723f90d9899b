//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search engine.

use search_dsl_shared::ScopeError;
use thiserror::Error;

use super::BulkItemError;

/// Errors that can occur during search engine operations.
///
/// Nothing in this crate retries; every variant is propagated to the caller.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The engine could not be reached.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// The engine answered with a non-2xx status.
    #[error("Response failure with status {status}: {body}")]
    ResponseFailure { status: u16, body: String },

    /// One or more bulk operations reported per-item errors.
    #[error("Bulk operation failed for {} item(s)", .0.len())]
    BulkItemFailure(Vec<BulkItemError>),

    /// A multi-search answered with a different number of responses than
    /// requests were sent.
    #[error("Protocol mismatch: sent {expected} request(s), received {actual} response(s)")]
    ProtocolMismatch { expected: usize, actual: usize },

    /// Failed to parse a response from the engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A criteria cannot be executed as given, e.g. it has no index target.
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Invalid connection configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Named scope lookup failed.
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl SearchError {
    /// Create a connection failure.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionFailure(msg.into())
    }

    /// Create a response failure.
    pub fn response(status: u16, body: impl Into<String>) -> Self {
        Self::ResponseFailure {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid criteria error.
    pub fn invalid_criteria(msg: impl Into<String>) -> Self {
        Self::InvalidCriteria(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// The HTTP status carried by a response failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ResponseFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 404 response, which existence checks treat as "absent".
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
