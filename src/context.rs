//! Immutable service context handed to every pipeline.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::ModelRegistry;
use crate::vectordb::VectorStore;

/// Model registry + storage engine. Cheap to clone.
#[derive(Debug)]
pub struct ServiceContext<S> {
    pub models: Arc<ModelRegistry>,
    pub store: S,
}

impl<S: Clone> Clone for ServiceContext<S> {
    fn clone(&self) -> Self {
        Self {
            models: Arc::clone(&self.models),
            store: self.store.clone(),
        }
    }
}

impl<S: VectorStore> ServiceContext<S> {
    pub fn new(models: Arc<ModelRegistry>, store: S) -> Self {
        Self { models, store }
    }

    /// Embeds `texts` with `model_id` in one model call, off the async runtime.
    pub async fn embed_batch(
        &self,
        model_id: &str,
        texts: Vec<String>,
    ) -> ServiceResult<Vec<Vec<f32>>> {
        let embedder = self.models.embedder(model_id)?;
        debug!(model_id, texts = texts.len(), "Embedding batch");

        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder.embed_batch(&refs)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("embedding task failed: {e}")))?
        .map_err(ServiceError::from)
    }

    pub async fn embed(&self, model_id: &str, text: String) -> ServiceResult<Vec<f32>> {
        self.embed_batch(model_id, vec![text])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::Internal("embedder returned no vector".to_string()))
    }

    /// Cross-encoder ranking of `texts` against `query`, off the async runtime.
    ///
    /// Returns `(input_index, score)` by descending score; ties keep input order.
    pub async fn rerank(
        &self,
        query: String,
        texts: Vec<String>,
    ) -> ServiceResult<Vec<(usize, f32)>> {
        let reranker = self.models.reranker()?;

        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            reranker.rerank(&query, &refs)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("scoring task failed: {e}")))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}
