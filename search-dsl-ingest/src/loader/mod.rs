//! Loader module for the search DSL ingest.
//!
//! Streams records from a [`RecordSource`] into the search index through a
//! bulk writer.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use search_dsl_repository::{BulkAction, BulkOptions, BulkSummary, Connection};
use search_dsl_shared::IndexTarget;

use crate::errors::IngestError;
use crate::source::RecordSource;

/// How a record becomes a search document.
pub trait IndexDocument {
    /// The document id.
    fn id(&self) -> String;

    /// The document body. Only called for index, create and update.
    fn to_document(&self) -> Result<Value, IngestError>;

    /// Per-operation metadata merged into the bulk action line, e.g.
    /// `version` and `version_type` or `routing`.
    fn index_options(&self) -> Option<Map<String, Value>> {
        None
    }
}

/// Serialize any serde record as a document body.
pub fn to_document<T: Serialize>(record: &T) -> Result<Value, IngestError> {
    Ok(serde_json::to_value(record)?)
}

/// Configuration for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Number of records pulled from the source at a time.
    pub batch_size: usize,
    /// Bulk settings. `None` uses the connection's.
    pub bulk: Option<BulkOptions>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            bulk: None,
        }
    }
}

/// Indexes whole record sources into one index target.
pub struct Indexer {
    connection: Arc<Connection>,
    target: Arc<IndexTarget>,
    config: IndexerConfig,
}

impl Indexer {
    /// Create a new indexer with default configuration.
    pub fn new(connection: Arc<Connection>, target: Arc<IndexTarget>) -> Self {
        Self::with_config(connection, target, IndexerConfig::default())
    }

    /// Create a new indexer with custom configuration.
    pub fn with_config(
        connection: Arc<Connection>,
        target: Arc<IndexTarget>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            connection,
            target,
            config,
        }
    }

    pub fn target(&self) -> &Arc<IndexTarget> {
        &self.target
    }

    /// Index (insert or replace) every record of the source.
    pub async fn index<S>(&self, source: &mut S) -> Result<BulkSummary, IngestError>
    where
        S: RecordSource,
        S::Record: IndexDocument,
    {
        self.run(BulkAction::Index, source).await
    }

    /// Create every record of the source. Existing documents are item errors
    /// unless `409` is in the bulk options' ignored statuses.
    pub async fn create<S>(&self, source: &mut S) -> Result<BulkSummary, IngestError>
    where
        S: RecordSource,
        S::Record: IndexDocument,
    {
        self.run(BulkAction::Create, source).await
    }

    /// Partially update every record of the source.
    pub async fn update<S>(&self, source: &mut S) -> Result<BulkSummary, IngestError>
    where
        S: RecordSource,
        S::Record: IndexDocument,
    {
        self.run(BulkAction::Update, source).await
    }

    /// Delete the documents of every record of the source.
    pub async fn delete<S>(&self, source: &mut S) -> Result<BulkSummary, IngestError>
    where
        S: RecordSource,
        S::Record: IndexDocument,
    {
        self.run(BulkAction::Delete, source).await
    }

    #[instrument(skip(self, source), fields(index = %self.target.index_name()))]
    async fn run<S>(&self, action: BulkAction, source: &mut S) -> Result<BulkSummary, IngestError>
    where
        S: RecordSource,
        S::Record: IndexDocument,
    {
        let mut bulk = match &self.config.bulk {
            Some(options) => self.connection.bulk_with(self.target.clone(), options.clone()),
            None => self.connection.bulk(self.target.clone()),
        };

        loop {
            let records = source.next_batch(self.config.batch_size).await?;
            if records.is_empty() {
                break;
            }
            debug!(count = records.len(), action = action.as_str(), "Queueing records");

            for record in records {
                let id = record.id();
                let metadata = record.index_options();
                match action {
                    BulkAction::Index => {
                        bulk.index(&id, &record.to_document()?, metadata.as_ref())
                            .await?
                    }
                    BulkAction::Create => {
                        bulk.create(&id, &record.to_document()?, metadata.as_ref())
                            .await?
                    }
                    BulkAction::Update => {
                        bulk.update(&id, &record.to_document()?, metadata.as_ref())
                            .await?
                    }
                    BulkAction::Delete => bulk.delete(&id, metadata.as_ref()).await?,
                }
            }
        }

        let summary = bulk.finish().await?;
        info!(
            action = action.as_str(),
            operations = summary.operations,
            requests = summary.requests,
            "Indexing completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;
    use async_trait::async_trait;
    use search_dsl_repository::{ConnectionConfig, SearchError, Transport, TransportRequest};
    use search_dsl_shared::Dialect;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Mock transport recording bulk bodies.
    struct MockTransport {
        requests: Arc<Mutex<Vec<TransportRequest>>>,
        item_error: Option<Value>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                item_error: None,
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: TransportRequest) -> Result<Value, SearchError> {
            self.requests.lock().await.push(request);
            let items: Vec<Value> = self.item_error.iter().cloned().collect();
            Ok(json!({ "errors": !items.is_empty(), "items": items }))
        }
    }

    #[derive(Serialize)]
    struct Product {
        id: u32,
        title: String,
        #[serde(skip)]
        version: Option<u64>,
    }

    impl Product {
        fn new(id: u32, title: &str) -> Self {
            Self {
                id,
                title: title.to_string(),
                version: None,
            }
        }
    }

    impl IndexDocument for Product {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn to_document(&self) -> Result<Value, IngestError> {
            to_document(self)
        }

        fn index_options(&self) -> Option<Map<String, Value>> {
            let version = self.version?;
            let mut options = Map::new();
            options.insert("version".to_string(), json!(version));
            options.insert("version_type".to_string(), json!("external"));
            Some(options)
        }
    }

    fn indexer(transport: Arc<MockTransport>, config: IndexerConfig) -> Indexer {
        let connection = Connection::new(transport, Dialect::Modern, ConnectionConfig::default());
        Indexer::with_config(
            Arc::new(connection),
            Arc::new(IndexTarget::new("products")),
            config,
        )
    }

    async fn bulk_lines(transport: &MockTransport) -> Vec<Vec<Value>> {
        transport
            .requests
            .lock()
            .await
            .iter()
            .map(|request| {
                request
                    .ndjson_body()
                    .unwrap()
                    .lines()
                    .map(|line| serde_json::from_str(line).unwrap())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_index_source_in_bulk_batches() {
        let transport = Arc::new(MockTransport::new());
        let indexer = indexer(
            transport.clone(),
            IndexerConfig {
                batch_size: 2,
                bulk: Some(BulkOptions::default().with_batch_size(3)),
            },
        );

        let mut source = VecSource::new((1..=4).map(|id| Product::new(id, "title")).collect());
        let summary = indexer.index(&mut source).await.unwrap();

        assert_eq!(summary.operations, 4);
        assert_eq!(summary.requests, 2);

        let requests = bulk_lines(&transport).await;
        assert_eq!(requests[0].len(), 6);
        assert_eq!(requests[0][0], json!({ "index": { "_id": "1" } }));
        assert_eq!(requests[0][1], json!({ "id": 1, "title": "title" }));
        assert_eq!(requests[1].len(), 2);
    }

    #[tokio::test]
    async fn test_update_wraps_document_and_passes_options() {
        let transport = Arc::new(MockTransport::new());
        let indexer = indexer(transport.clone(), IndexerConfig::default());

        let mut product = Product::new(7, "new title");
        product.version = Some(3);
        indexer.update(&mut VecSource::new(vec![product])).await.unwrap();

        let requests = bulk_lines(&transport).await;
        assert_eq!(
            requests[0],
            vec![
                json!({ "update": { "_id": "7", "version": 3, "version_type": "external" } }),
                json!({ "doc": { "id": 7, "title": "new title" } }),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_sends_no_document_lines() {
        let transport = Arc::new(MockTransport::new());
        let indexer = indexer(transport.clone(), IndexerConfig::default());

        let mut source = VecSource::new(vec![Product::new(1, "a"), Product::new(2, "b")]);
        indexer.delete(&mut source).await.unwrap();

        let requests = bulk_lines(&transport).await;
        assert_eq!(
            requests[0],
            vec![json!({ "delete": { "_id": "1" } }), json!({ "delete": { "_id": "2" } })]
        );
    }

    #[tokio::test]
    async fn test_empty_source_sends_nothing() {
        let transport = Arc::new(MockTransport::new());
        let indexer = indexer(transport.clone(), IndexerConfig::default());

        let summary = indexer
            .create(&mut VecSource::<Product>::new(Vec::new()))
            .await
            .unwrap();
        assert_eq!(summary.requests, 0);
        assert!(transport.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_item_errors_surface_as_search_error() {
        let transport = Arc::new(MockTransport {
            requests: Arc::new(Mutex::new(Vec::new())),
            item_error: Some(json!({
                "create": { "_id": "1", "status": 409, "error": { "type": "version_conflict_engine_exception" } }
            })),
        });
        let indexer = indexer(transport.clone(), IndexerConfig::default());

        let err = indexer
            .create(&mut VecSource::new(vec![Product::new(1, "a")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::SearchError(SearchError::BulkItemFailure(ref errors)) if errors.len() == 1
        ));

        let tolerant = Indexer::with_config(
            Arc::new(Connection::new(
                transport.clone(),
                Dialect::Modern,
                ConnectionConfig::default(),
            )),
            Arc::new(IndexTarget::new("products")),
            IndexerConfig {
                batch_size: 1000,
                bulk: Some(BulkOptions::default().ignore_errors([409])),
            },
        );
        assert!(tolerant
            .create(&mut VecSource::new(vec![Product::new(1, "a")]))
            .await
            .is_ok());
    }
}
