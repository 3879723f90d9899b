//! Search engine connection.
//!
//! [`Connection`] owns the transport and the request dialect. The dialect is
//! fixed when the connection is created, either from configuration or from
//! the version the engine reports, and is never re-detected per request.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use search_dsl_shared::{Criteria, Dialect, IndexTarget};

use crate::bulk::{Bulk, BulkOptions};
use crate::config::ConnectionConfig;
use crate::errors::SearchError;
use crate::interfaces::{Transport, TransportRequest};
use crate::opensearch::{build_query, compile};
use crate::response::Response;
use crate::scroll::Scroll;

/// Executes criteria against the engine.
pub struct Connection {
    transport: Arc<dyn Transport>,
    dialect: Dialect,
    config: ConnectionConfig,
}

impl Connection {
    /// Create a connection with an explicit dialect.
    pub fn new(transport: Arc<dyn Transport>, dialect: Dialect, config: ConnectionConfig) -> Self {
        Self {
            transport,
            dialect,
            config,
        }
    }

    /// Create a connection, asking the engine for its version unless the
    /// config fixes the dialect.
    #[instrument(skip(transport, config))]
    pub async fn connect(
        transport: Arc<dyn Transport>,
        config: ConnectionConfig,
    ) -> Result<Self, SearchError> {
        let dialect = match config.dialect {
            Some(dialect) => dialect,
            None => {
                let version = fetch_version(transport.as_ref()).await?;
                let dialect = Dialect::from_version(&version);
                info!(version = %version, dialect = ?dialect, "Detected search engine version");
                dialect
            }
        };

        Ok(Self::new(transport, dialect, config))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// The request body this connection would send for `criteria`.
    pub fn compile(&self, criteria: &Criteria) -> Value {
        compile(criteria, self.dialect)
    }

    /// The engine's version number, e.g. `"2.11.1"`.
    pub async fn version(&self) -> Result<String, SearchError> {
        fetch_version(self.transport.as_ref()).await
    }

    /// Run a search.
    ///
    /// A criteria carrying a scroll id is sent as a scroll continuation: the
    /// body is replaced by `{scroll, scroll_id}` and the compiled query is
    /// not sent. Failsafe criteria turn connection and response failures
    /// into an empty response.
    #[instrument(skip(self, criteria))]
    pub async fn search(&self, criteria: &Criteria) -> Result<Response, SearchError> {
        match self.execute(criteria).await {
            Ok(raw) => Ok(Response::new(criteria.clone(), raw)),
            Err(err @ (SearchError::ConnectionFailure(_) | SearchError::ResponseFailure { .. }))
                if criteria.is_failsafe() =>
            {
                warn!(error = %err, "Search failed, returning an empty response");
                Ok(Response::empty(criteria.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn execute(&self, criteria: &Criteria) -> Result<Value, SearchError> {
        let request = match criteria.scroll_options() {
            Some(scroll) if scroll.id.is_some() => TransportRequest::post("/_search/scroll")
                .with_json(json!({ "scroll": scroll.timeout, "scroll_id": scroll.id })),
            scroll => {
                let target = require_target(criteria)?;
                let mut request = TransportRequest::post(format!("{}/_search", target.path()))
                    .with_json(self.compile(criteria));
                if let Some(scroll) = scroll {
                    request = request.with_param("scroll", scroll.timeout.clone());
                }
                request
            }
        };

        debug!(path = %request.path, "Executing search");
        self.transport.send(request).await
    }

    /// Total number of matching documents, without fetching any hits.
    pub async fn total_entries(&self, criteria: &Criteria) -> Result<u64, SearchError> {
        let response = self.search(&criteria.limit(0)).await?;
        Ok(response.total_entries())
    }

    /// Run several searches in one `_msearch` request. Responses are paired
    /// with the criteria by position.
    #[instrument(skip(self, criterias), fields(count = criterias.len()))]
    pub async fn msearch(&self, criterias: &[Criteria]) -> Result<Vec<Response>, SearchError> {
        if criterias.is_empty() {
            return Ok(Vec::new());
        }

        let mut payload = String::new();
        for criteria in criterias {
            let target = require_target(criteria)?;
            let mut header = json!({ "index": target.index_name() });
            if let Some(type_name) = target.type_name() {
                header["type"] = json!(type_name);
            }

            for line in [header, self.compile(criteria)] {
                let line =
                    serde_json::to_string(&line).map_err(|e| SearchError::parse(e.to_string()))?;
                payload.push_str(&line);
                payload.push('\n');
            }
        }

        let raw = self
            .transport
            .send(TransportRequest::post("/_msearch").with_ndjson(payload))
            .await?;

        let responses = match raw.get("responses") {
            Some(Value::Array(responses)) => responses.clone(),
            _ => return Err(SearchError::parse("Multi-search response has no responses list")),
        };

        if responses.len() != criterias.len() {
            return Err(SearchError::ProtocolMismatch {
                expected: criterias.len(),
                actual: responses.len(),
            });
        }

        Ok(criterias
            .iter()
            .cloned()
            .zip(responses)
            .map(|(criteria, raw)| Response::new(criteria, raw))
            .collect())
    }

    /// Delete every document matching the criteria's query.
    #[instrument(skip(self, criteria))]
    pub async fn delete_by_query(&self, criteria: &Criteria) -> Result<Value, SearchError> {
        let target = require_target(criteria)?;
        let query = build_query(criteria, self.dialect).unwrap_or_else(|| json!({ "match_all": {} }));
        let body = json!({ "query": query });

        let request = match self.dialect {
            Dialect::Modern => {
                TransportRequest::post(format!("/{}/_delete_by_query", target.index_name()))
            }
            Dialect::Legacy => TransportRequest::delete(format!("{}/_query", target.path())),
        };

        let response = self.transport.send(request.with_json(body)).await?;
        info!(index = %target.index_name(), "Deleted documents by query");
        Ok(response)
    }

    /// Whether an alias exists. A 404 answer means it does not.
    pub async fn alias_exists(&self, alias: &str) -> Result<bool, SearchError> {
        match self
            .transport
            .send(TransportRequest::get(format!("/_alias/{}", alias)))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// A bulk writer for `target` using the connection's bulk settings.
    pub fn bulk(&self, target: Arc<IndexTarget>) -> Bulk {
        self.bulk_with(target, BulkOptions::from_config(&self.config))
    }

    pub fn bulk_with(&self, target: Arc<IndexTarget>, options: BulkOptions) -> Bulk {
        Bulk::new(self.transport.clone(), target, options)
    }

    /// Iterate a scroll search page by page.
    pub fn scroll(&self, criteria: Criteria, timeout: impl Into<String>) -> Scroll<'_> {
        Scroll::new(self, criteria, timeout)
    }

    /// Iterate all matches in pages of `batch_size` hits.
    pub fn find_in_batches(
        &self,
        criteria: &Criteria,
        batch_size: u64,
        timeout: impl Into<String>,
    ) -> Scroll<'_> {
        self.scroll(criteria.limit(batch_size), timeout)
    }
}

async fn fetch_version(transport: &dyn Transport) -> Result<String, SearchError> {
    let raw = transport.send(TransportRequest::get("/")).await?;
    raw.pointer("/version/number")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SearchError::parse("Response has no version number"))
}

fn require_target(criteria: &Criteria) -> Result<&IndexTarget, SearchError> {
    criteria
        .target()
        .ok_or_else(|| SearchError::invalid_criteria("Criteria has no index target"))
}
