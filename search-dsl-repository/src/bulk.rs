//! Bulk write batching.
//!
//! [`Bulk`] buffers index/create/update/delete operations as newline-delimited
//! action and document lines and sends them in bounded requests. A request
//! is issued as soon as the buffer reaches the operation limit or the byte
//! limit, and once more by [`Bulk::finish`] for the remainder.
//!
//! Per-item errors do not stop the run. They are collected across all
//! requests and returned together by `finish`.
//!
//! A `Bulk` is driven by a single owner through `&mut self` and is not meant
//! to be shared between concurrent writers.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use search_dsl_shared::IndexTarget;

use crate::config::{ConnectionConfig, DEFAULT_BULK_LIMIT};
use crate::errors::{BulkItemError, SearchError};
use crate::interfaces::{Transport, TransportRequest};

/// Options for one bulk run.
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Operations per request.
    pub batch_size: usize,
    /// Byte size of a request body that triggers a flush.
    pub max_bytes: Option<usize>,
    /// Item statuses that are not treated as failures, e.g. `409` when
    /// creating documents that may already exist.
    pub ignore_errors: Vec<u16>,
    /// Refresh the index after the last request.
    pub refresh: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BULK_LIMIT,
            max_bytes: None,
            ignore_errors: Vec::new(),
            refresh: false,
        }
    }
}

impl BulkOptions {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            batch_size: config.bulk_limit,
            max_bytes: config.bulk_max_bytes,
            ignore_errors: Vec::new(),
            refresh: config.refresh_after_bulk,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn ignore_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.ignore_errors.extend(statuses);
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// A bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Index,
    Create,
    Update,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Create => "create",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }
}

/// Summary of a finished bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Operations sent.
    pub operations: usize,
    /// Requests issued against the `_bulk` endpoint.
    pub requests: usize,
}

/// Buffered bulk writer for one index target.
pub struct Bulk {
    transport: Arc<dyn Transport>,
    target: Arc<IndexTarget>,
    options: BulkOptions,
    buffer: String,
    pending: usize,
    errors: Vec<BulkItemError>,
    summary: BulkSummary,
}

impl Bulk {
    pub fn new(transport: Arc<dyn Transport>, target: Arc<IndexTarget>, options: BulkOptions) -> Self {
        Self {
            transport,
            target,
            options,
            buffer: String::new(),
            pending: 0,
            errors: Vec::new(),
            summary: BulkSummary::default(),
        }
    }

    pub fn options(&self) -> &BulkOptions {
        &self.options
    }

    /// Operations buffered and not yet sent.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub async fn index(
        &mut self,
        id: &str,
        document: &Value,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), SearchError> {
        self.push(BulkAction::Index, id, Some(document), metadata)
            .await
    }

    pub async fn create(
        &mut self,
        id: &str,
        document: &Value,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), SearchError> {
        self.push(BulkAction::Create, id, Some(document), metadata)
            .await
    }

    /// Partial update. The document is sent as `{"doc": document}`.
    pub async fn update(
        &mut self,
        id: &str,
        document: &Value,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), SearchError> {
        let partial = json!({ "doc": document });
        self.push(BulkAction::Update, id, Some(&partial), metadata)
            .await
    }

    pub async fn delete(
        &mut self,
        id: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), SearchError> {
        self.push(BulkAction::Delete, id, None, metadata).await
    }

    async fn push(
        &mut self,
        action: BulkAction,
        id: &str,
        document: Option<&Value>,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), SearchError> {
        let mut header = Map::new();
        header.insert("_id".to_string(), json!(id));
        if let Some(metadata) = metadata {
            header.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let action_line = serde_json::to_string(&json!({ action.as_str(): header }))
            .map_err(|e| SearchError::parse(e.to_string()))?;
        self.buffer.push_str(&action_line);
        self.buffer.push('\n');

        if let Some(document) = document {
            let document_line =
                serde_json::to_string(document).map_err(|e| SearchError::parse(e.to_string()))?;
            self.buffer.push_str(&document_line);
            self.buffer.push('\n');
        }

        self.pending += 1;

        if self.should_flush() {
            self.flush().await?;
        }
        Ok(())
    }

    fn should_flush(&self) -> bool {
        self.pending >= self.options.batch_size.max(1)
            || self
                .options
                .max_bytes
                .is_some_and(|max_bytes| self.buffer.len() >= max_bytes)
    }

    /// Send the buffered operations. Does nothing when the buffer is empty.
    #[instrument(skip(self), fields(index = %self.target.index_name(), operations = self.pending))]
    pub async fn flush(&mut self) -> Result<(), SearchError> {
        if self.pending == 0 {
            return Ok(());
        }

        // The buffer is kept until the engine accepts it, so a failed send
        // is retried by the next flush.
        let request = TransportRequest::post(format!("{}/_bulk", self.target.path()))
            .with_ndjson(self.buffer.clone());
        let response = self.transport.send(request).await?;

        self.buffer.clear();
        self.summary.operations += std::mem::replace(&mut self.pending, 0);
        self.summary.requests += 1;

        let failed = self.collect_errors(&response);
        if failed > 0 {
            warn!(failed = failed, "Bulk request reported item errors");
        } else {
            debug!("Bulk request completed");
        }
        Ok(())
    }

    fn collect_errors(&mut self, response: &Value) -> usize {
        let Some(items) = response.get("items").and_then(Value::as_array) else {
            return 0;
        };

        let before = self.errors.len();
        self.errors.extend(
            items
                .iter()
                .filter_map(BulkItemError::from_item)
                .filter(|error| {
                    !error
                        .status
                        .is_some_and(|status| self.options.ignore_errors.contains(&status))
                }),
        );
        self.errors.len() - before
    }

    /// Send the remaining operations, refresh if requested, and report every
    /// item error collected during the run.
    #[instrument(skip(self), fields(index = %self.target.index_name()))]
    pub async fn finish(mut self) -> Result<BulkSummary, SearchError> {
        self.flush().await?;

        if self.options.refresh && self.summary.requests > 0 {
            let request = TransportRequest::post(format!("/{}/_refresh", self.target.index_name()));
            self.transport.send(request).await?;
        }

        info!(
            operations = self.summary.operations,
            requests = self.summary.requests,
            errors = self.errors.len(),
            "Bulk run finished"
        );

        let errors = std::mem::take(&mut self.errors);
        if errors.is_empty() {
            Ok(std::mem::take(&mut self.summary))
        } else {
            Err(SearchError::BulkItemFailure(errors))
        }
    }
}

impl Drop for Bulk {
    fn drop(&mut self) {
        if self.pending > 0 {
            warn!(
                index = %self.target.index_name(),
                pending = self.pending,
                "Bulk dropped with unsent operations"
            );
        }
    }
}
