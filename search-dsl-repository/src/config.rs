//! Configuration types for the Connection.

use search_dsl_shared::Dialect;

/// Default number of operations per bulk request.
pub const DEFAULT_BULK_LIMIT: usize = 1000;

/// Default byte size of a bulk request body before it is flushed.
pub const DEFAULT_BULK_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the Connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Request dialect. `None` asks the engine for its version once, when the
    /// connection is established.
    pub dialect: Option<Dialect>,
    /// Maximum number of operations sent in a single bulk request.
    pub bulk_limit: usize,
    /// Maximum byte size of a single bulk request body.
    /// Set to None to flush on operation count only.
    pub bulk_max_bytes: Option<usize>,
    /// Refresh the target index once a bulk run has finished.
    pub refresh_after_bulk: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            bulk_limit: DEFAULT_BULK_LIMIT,
            bulk_max_bytes: Some(DEFAULT_BULK_MAX_BYTES),
            refresh_after_bulk: false,
        }
    }
}

impl ConnectionConfig {
    /// Create a config with a fixed dialect, skipping version detection.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect: Some(dialect),
            ..Self::default()
        }
    }

    /// Create a config with a custom bulk operation limit.
    pub fn with_bulk_limit(bulk_limit: usize) -> Self {
        Self {
            bulk_limit,
            ..Self::default()
        }
    }
}
