//! Transport contract for the REST resource store
//!
//! Object-safe JSON verbs so the dashboard core can hold a
//! `Arc<dyn ResourceTransport>` and tests can swap in a scripted transport.

use crate::ClientResult;
use async_trait::async_trait;
use serde_json::Value;

/// The four verbs the dashboard core needs from the backing store.
///
/// Request and response bodies are JSON documents; the store assigns ids on
/// POST and echoes the full created object.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> ClientResult<Value>;
    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn patch_json(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn delete_json(&self, path: &str) -> ClientResult<Value>;
}
