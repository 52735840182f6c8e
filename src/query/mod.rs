//! Nearest-neighbor query against a collection's bound model.


use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::collections::resolve_model;
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::MetadataFilter;
use crate::vectordb::{SearchHit, VectorStore};

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub collection: Option<String>,
    pub query: String,
    pub top_k: u64,
    pub filter: Option<MetadataFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Ascending by distance.
    pub results: Vec<SearchHit>,
    pub collection_metadata: Map<String, Value>,
}

pub async fn query<S: VectorStore>(
    ctx: &ServiceContext<S>,
    request: QueryRequest,
) -> ServiceResult<QueryResponse> {
    let collection = match request.collection.as_deref() {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ServiceError::invalid("'collection' is required")),
    };
    if request.query.trim().is_empty() {
        return Err(ServiceError::invalid("'query' must be non-empty"));
    }
    if request.top_k == 0 {
        return Err(ServiceError::invalid("'top_k' must be at least 1"));
    }

    let resolved = resolve_model(ctx, collection).await?;
    let vector = ctx.embed(&resolved.model_id, request.query).await?;

    let results = ctx
        .store
        .search(collection, vector, request.top_k, request.filter.as_ref())
        .await?;

    debug!(
        collection,
        model_id = %resolved.model_id,
        top_k = request.top_k,
        hits = results.len(),
        "Query complete"
    );

    Ok(QueryResponse {
        results,
        collection_metadata: resolved.metadata,
    })
}
