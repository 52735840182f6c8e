//! HTTP client helpers for tests.

use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    async fn finish(resp: reqwest::Response) -> Result<(u16, Value), TestClientError> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|_| TestClientError::NotJson(status, text))?
        };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::finish(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.post(self.url(path)).json(&body).send().await?;
        Self::finish(resp).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.put(self.url(path)).json(&body).send().await?;
        Self::finish(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.delete(self.url(path)).send().await?;
        Self::finish(resp).await
    }

    pub async fn delete_json(
        &self,
        path: &str,
        body: Value,
    ) -> Result<(u16, Value), TestClientError> {
        let resp = self.client.delete(self.url(path)).json(&body).send().await?;
        Self::finish(resp).await
    }

    pub async fn create_collection(
        &self,
        name: &str,
        model: &str,
    ) -> Result<(u16, Value), TestClientError> {
        self.post(
            "/collections",
            serde_json::json!({"name": name, "embedding_model": model}),
        )
        .await
    }

    pub async fn add_documents(
        &self,
        collection: &str,
        documents: Value,
    ) -> Result<(u16, Value), TestClientError> {
        self.post(
            &format!("/collections/{collection}/documents"),
            serde_json::json!({ "documents": documents }),
        )
        .await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Non-JSON response ({0}): {1}")]
    NotJson(u16, String),
}
