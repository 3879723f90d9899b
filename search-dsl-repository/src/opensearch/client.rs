//! OpenSearch transport implementation.
//!
//! This module provides the concrete implementation of `Transport` using the
//! OpenSearch Rust client's low-level `send` API.

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method,
    },
    OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::{HttpMethod, RequestBody, Transport, TransportRequest};

/// Transport backed by the OpenSearch client.
///
/// Works against OpenSearch and Elasticsearch alike, since only raw paths and
/// bodies are sent.
///
/// # Example
///
/// ```ignore
/// let transport = OpenSearchTransport::new("http://localhost:9200")?;
/// let info = transport.send(TransportRequest::get("/")).await?;
/// println!("{}", info["version"]["number"]);
/// ```
pub struct OpenSearchTransport {
    client: OpenSearch,
}

impl OpenSearchTransport {
    /// Create a new transport connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The engine URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchTransport)` - A new transport instance
    /// * `Err(SearchError)` - If the URL is invalid or transport setup fails
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::configuration(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch transport");

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Put => Method::Put,
            HttpMethod::Post => Method::Post,
            HttpMethod::Delete => Method::Delete,
        }
    }
}

#[async_trait]
impl Transport for OpenSearchTransport {
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    async fn send(&self, request: TransportRequest) -> Result<Value, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let body = match request.body {
            Some(RequestBody::Json(value)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_string(&value).map_err(|e| SearchError::parse(e.to_string()))?)
            }
            Some(RequestBody::NdJson(lines)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
                Some(lines)
            }
            None => None,
        };

        let query_string = (!request.params.is_empty()).then_some(request.params.as_slice());

        let response = self
            .client
            .send(
                Self::method(request.method),
                &request.path,
                headers,
                query_string,
                body,
                None,
            )
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !status.is_success() {
            error!(status = %status, body = %text, "Request failed");
            return Err(SearchError::response(status.as_u16(), text));
        }

        debug!(status = %status, bytes = text.len(), "Request succeeded");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| SearchError::parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let result = OpenSearchTransport::new("not a url");
        assert!(matches!(result, Err(SearchError::ConfigurationError(_))));
    }

    #[test]
    fn test_method_mapping() {
        assert!(matches!(OpenSearchTransport::method(HttpMethod::Get), Method::Get));
        assert!(matches!(OpenSearchTransport::method(HttpMethod::Delete), Method::Delete));
    }
}
