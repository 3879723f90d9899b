//! Transport trait definition.
//!
//! The transport is the only component that performs network I/O. Everything
//! above it builds requests and decodes the JSON it hands back.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;

/// HTTP verbs used against the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A single JSON document, sent as `application/json`.
    Json(Value),
    /// Newline-delimited JSON, sent as `application/x-ndjson`.
    NdJson(String),
}

/// One HTTP request against the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Absolute path, e.g. `/products/_search`.
    pub path: String,
    /// Query string parameters.
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_ndjson(mut self, body: String) -> Self {
        self.body = Some(RequestBody::NdJson(body));
        self
    }

    /// The JSON body, if this request carries one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(body)) => Some(body),
            _ => None,
        }
    }

    /// The newline-delimited body, if this request carries one.
    pub fn ndjson_body(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::NdJson(body)) => Some(body),
            _ => None,
        }
    }
}

/// Abstract HTTP transport to the search engine.
///
/// Implementations must map network-level errors to
/// [`SearchError::ConnectionFailure`] and non-2xx statuses to
/// [`SearchError::ResponseFailure`], and must not retry.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the parsed JSON response body.
    ///
    /// An empty response body is returned as `Value::Null`.
    async fn send(&self, request: TransportRequest) -> Result<Value, SearchError>;
}
