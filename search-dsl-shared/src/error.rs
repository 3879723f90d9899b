//! Error types for the shared criteria layer.

use thiserror::Error;

/// Errors raised while resolving index definition scopes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// No scope with this name is registered on the index definition.
    #[error("Unknown scope: {0}")]
    UnknownScope(String),
}

impl ScopeError {
    /// Create an unknown scope error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownScope(name.into())
    }
}
