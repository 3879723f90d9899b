//! In-memory transport used by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::errors::SearchError;
use crate::interfaces::{Transport, TransportRequest};

/// Records every request and answers from a queue of canned responses.
/// Once the queue is empty it answers with an empty, successful body.
pub(crate) struct MockTransport {
    pub requests: Arc<Mutex<Vec<TransportRequest>>>,
    responses: Mutex<VecDeque<Result<Value, SearchError>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<Result<Value, SearchError>>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Mutex::new(responses.into()),
        }
    }

    pub async fn recorded(&self) -> Vec<TransportRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<Value, SearchError> {
        self.requests.lock().await.push(request);
        match self.responses.lock().await.pop_front() {
            Some(response) => response,
            None => Ok(json!({
                "took": 1,
                "errors": false,
                "items": [],
                "hits": { "total": 0, "hits": [] }
            })),
        }
    }
}
