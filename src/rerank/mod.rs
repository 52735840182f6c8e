//! Cross-encoder rerank of caller-supplied candidates. Never touches storage.


use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::RegistryError;
use crate::vectordb::VectorStore;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RerankCandidate {
    #[serde(default)]
    pub id: Option<Value>,
    pub text: String,
}

impl RerankCandidate {
    pub fn new(id: impl Into<Value>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankedItem {
    /// Echoes the candidate id (`null` if none was given).
    pub id: Value,
    pub score: f32,
    /// 0-based position in the input.
    pub original_rank: usize,
}

/// Scores every candidate against `query`, highest first, truncated to `top_k`.
pub async fn rerank<S: VectorStore>(
    ctx: &ServiceContext<S>,
    query: &str,
    candidates: Vec<RerankCandidate>,
    top_k: Option<usize>,
) -> ServiceResult<Vec<RerankedItem>> {
    if !ctx.models.has_reranker() {
        return Err(RegistryError::RerankerNotLoaded.into());
    }
    if query.trim().is_empty() {
        return Err(ServiceError::invalid("'query' must be non-empty"));
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let ranked = ctx.rerank(query.to_string(), texts).await?;

    let limit = top_k.unwrap_or(ranked.len());
    let mut ids: Vec<Option<Value>> = candidates.into_iter().map(|c| c.id).collect();

    let items: Vec<RerankedItem> = ranked
        .into_iter()
        .take(limit)
        .map(|(idx, score)| RerankedItem {
            id: ids[idx].take().unwrap_or(Value::Null),
            score,
            original_rank: idx,
        })
        .collect();

    debug!(
        candidates = ids.len(),
        returned = items.len(),
        top_score = items.first().map(|i| i.score),
        "Rerank complete"
    );

    Ok(items)
}
