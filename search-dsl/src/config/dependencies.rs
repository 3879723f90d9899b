//! Dependency initialization and wiring for the search DSL.

use std::sync::Arc;

use tracing::info;

use search_dsl_ingest::{Indexer, IndexerConfig};
use search_dsl_repository::{Connection, OpenSearchTransport, Transport};
use search_dsl_shared::IndexDefinition;

use crate::config::Settings;
use crate::SearchDslError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    /// The connection, with its dialect already settled.
    pub connection: Arc<Connection>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables, after loading
    /// a `.env` file if one is present.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SearchDslError)` - If the settings are invalid or the engine
    ///   cannot be reached for version detection
    pub async fn new() -> Result<Self, SearchDslError> {
        dotenv::dotenv().ok();
        let settings = Settings::from_env()?;
        Self::from_settings(settings).await
    }

    /// Initialize dependencies from explicit settings.
    pub async fn from_settings(settings: Settings) -> Result<Self, SearchDslError> {
        let transport = OpenSearchTransport::new(&settings.base_url).map_err(|e| {
            SearchDslError::config(format!("Failed to create search transport: {}", e))
        })?;

        Self::with_transport(settings, Arc::new(transport)).await
    }

    /// Initialize dependencies on top of an existing transport.
    pub async fn with_transport(
        settings: Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SearchDslError> {
        let connection = Connection::connect(transport, settings.connection_config()).await?;

        info!(
            base_url = %settings.base_url,
            dialect = ?connection.dialect(),
            "Search connection ready"
        );

        Ok(Self {
            settings,
            connection: Arc::new(connection),
        })
    }

    /// An index definition for `name`, carrying the configured prefix.
    pub fn index_definition(&self, name: &str) -> IndexDefinition {
        IndexDefinition::new(self.settings.target(name))
    }

    /// An indexer for the index behind `definition`.
    pub fn indexer(&self, definition: &IndexDefinition) -> Indexer {
        Indexer::with_config(
            self.connection.clone(),
            definition.target().clone(),
            IndexerConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_dsl_repository::{SearchError, TransportRequest};
    use search_dsl_shared::{Dialect, FieldFilter};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    struct MockTransport {
        requests: Mutex<Vec<TransportRequest>>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: TransportRequest) -> Result<Value, SearchError> {
            let path = request.path.clone();
            self.requests.lock().await.push(request);
            Ok(match path.as_str() {
                "/" => json!({ "version": { "number": "1.7.6" } }),
                _ => json!({ "hits": { "total": 0, "hits": [] }, "items": [] }),
            })
        }
    }

    #[tokio::test]
    async fn test_wiring_detects_dialect_and_prefixes_indices() {
        let transport = Arc::new(MockTransport {
            requests: Mutex::new(Vec::new()),
        });
        let settings = Settings {
            index_prefix: Some("test".to_string()),
            ..Settings::default()
        };

        let deps = Dependencies::with_transport(settings, transport.clone())
            .await
            .unwrap();
        assert_eq!(deps.connection.dialect(), Dialect::Legacy);

        let products = deps.index_definition("products");
        let criteria = products
            .criteria()
            .r#where([("price", FieldFilter::range(100, 200))]);
        deps.connection.search(&criteria).await.unwrap();

        let requests = transport.requests.lock().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path, "/test-products/_search");
        assert_eq!(
            requests[1].json_body().map(|b| b["query"]["filtered"]["filter"].clone()),
            Some(json!({ "range": { "price": { "gte": 100, "lte": 200 } } }))
        );
    }

    #[tokio::test]
    async fn test_fixed_dialect_skips_version_request() {
        let transport = Arc::new(MockTransport {
            requests: Mutex::new(Vec::new()),
        });
        let settings = Settings {
            dialect: Some(Dialect::Modern),
            ..Settings::default()
        };

        let deps = Dependencies::with_transport(settings, transport.clone())
            .await
            .unwrap();
        assert_eq!(deps.connection.dialect(), Dialect::Modern);
        assert!(transport.requests.lock().await.is_empty());

        let indexer = deps.indexer(&deps.index_definition("products"));
        assert_eq!(indexer.target().index_name(), "products");
    }

    #[tokio::test]
    async fn test_invalid_base_url() {
        let settings = Settings {
            base_url: "not a url".to_string(),
            ..Settings::default()
        };

        let result = Dependencies::from_settings(settings).await;
        assert!(matches!(result, Err(SearchDslError::ConfigError(_))));
    }
}
