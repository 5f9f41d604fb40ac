//! Scripted transport for tests
//!
//! Responses are stubbed per (method, path); failures are injected the same
//! way. Every call is recorded so tests can assert on request ordering, in
//! particular that an aborted multi-step create stops issuing requests.

use crate::transport::ResourceTransport;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    stubs: HashMap<(&'static str, String), Value>,
    failures: HashSet<(&'static str, String)>,
    log: Vec<RecordedRequest>,
}

/// In-memory transport with scripted responses
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the response for a (method, path) pair
    pub fn stub(&self, method: &'static str, path: &str, response: Value) {
        self.state
            .lock()
            .stubs
            .insert((method, path.to_string()), response);
    }

    /// Make every call to (method, path) fail with a network-class error
    pub fn fail(&self, method: &'static str, path: &str) {
        self.state
            .lock()
            .failures
            .insert((method, path.to_string()));
    }

    /// Remove a previously injected failure
    pub fn recover(&self, method: &'static str, path: &str) {
        self.state
            .lock()
            .failures
            .remove(&(method, path.to_string()));
    }

    /// All calls seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().log.clone()
    }

    fn dispatch(&self, method: &'static str, path: &str, body: Option<Value>) -> ClientResult<Value> {
        let mut state = self.state.lock();
        state.log.push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        if state.failures.contains(&(method, path.to_string())) {
            return Err(ClientError::Internal(format!(
                "stubbed failure: {method} {path}"
            )));
        }
        state
            .stubs
            .get(&(method, path.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{method} {path}")))
    }
}

#[async_trait]
impl ResourceTransport for MockTransport {
    async fn get_json(&self, path: &str) -> ClientResult<Value> {
        self.dispatch("GET", path, None)
    }

    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.dispatch("POST", path, Some(body))
    }

    async fn patch_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.dispatch("PATCH", path, Some(body))
    }

    async fn delete_json(&self, path: &str) -> ClientResult<Value> {
        self.dispatch("DELETE", path, None)
    }
}
