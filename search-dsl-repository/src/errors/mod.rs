//! Error types for the search DSL repository.

mod bulk_item_error;
mod search_error;

pub use bulk_item_error::BulkItemError;
pub use search_error::SearchError;
