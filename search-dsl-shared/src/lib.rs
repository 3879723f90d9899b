//! # Search DSL Shared
//!
//! Value types shared by the search DSL crates: filter clauses, the
//! chainable [`Criteria`], aggregation definitions, request dialects and
//! index definitions.

pub mod aggregation;
pub mod clause;
pub mod criteria;
pub mod dialect;
pub mod error;
pub mod target;

pub use aggregation::AggregationDef;
pub use clause::{Clause, FieldFilter};
pub use criteria::{Criteria, ScrollOptions, SortField, SortOrder};
pub use dialect::Dialect;
pub use error::ScopeError;
pub use target::{IndexDefinition, IndexTarget};
