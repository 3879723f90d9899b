//! # Search DSL Ingest
//!
//! This crate feeds records into the search index in bounded batches.
//!
//! ## Architecture
//!
//! 1. **Source**: a [`RecordSource`] yields records batch by batch, from an
//!    in-memory list or a paged store
//! 2. **Document**: [`IndexDocument`] turns a record into an id, a JSON body
//!    and per-operation metadata
//! 3. **Loader**: the [`Indexer`] drives index/create/update/delete through
//!    a bulk writer

pub mod errors;
pub mod loader;
pub mod source;

pub use errors::IngestError;
pub use loader::{to_document, IndexDocument, Indexer, IndexerConfig};
pub use source::{PageLoader, PagedSource, RecordSource, VecSource};
