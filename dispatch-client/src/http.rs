// dispatch-client/src/http.rs
// HTTP transport backed by reqwest

use crate::transport::ResourceTransport;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the REST resource store
#[derive(Debug, Clone)]
pub struct RestHttpClient {
    client: Client,
    base_url: String,
}

impl RestHttpClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL of the resource store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(format!("{status}: {text}"))),
            };
        }
        // DELETE responses may carry an empty body
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(ClientError::from)
    }

    /// Typed GET convenience wrapper
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let value = self.get_json(path).await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// Typed POST convenience wrapper
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let value = self.post_json(path, serde_json::to_value(body)?).await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }
}

#[async_trait]
impl ResourceTransport for RestHttpClient {
    async fn get_json(&self, path: &str) -> ClientResult<Value> {
        let response = self.client.get(self.url(path)).send().await?;
        self.handle_response(response).await
    }

    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        self.handle_response(response).await
    }

    async fn patch_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        let response = self.client.patch(self.url(path)).json(&body).send().await?;
        self.handle_response(response).await
    }

    async fn delete_json(&self, path: &str) -> ClientResult<Value> {
        let response = self.client.delete(self.url(path)).send().await?;
        self.handle_response(response).await
    }
}
