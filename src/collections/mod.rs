//! Collection registry and the model-binding protocol.
//!
//! A collection is bound to exactly one embedding model at creation, recorded under the
//! reserved `embedding_model` metadata key. [`resolve_model`] is the only way ingestion and
//! query find out which model to use; there is no per-request override and no default.

#[cfg(test)]
mod tests;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::constants::{
    DISTANCE_METRIC_COSINE, DISTANCE_METRIC_KEY, EMBEDDING_MODEL_KEY, RESERVED_METADATA_KEYS,
    is_reserved_key,
};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::vectordb::VectorStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: u64,
    pub metadata: Map<String, Value>,
}

/// One entry of [`list`]. `error` is set when the details could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub count: u64,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`resolve_model`].
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model_id: String,
    /// Full collection metadata, reserved keys included.
    pub metadata: Map<String, Value>,
}

/// Creates `name` bound to `model_id`. Returns the stored metadata.
pub async fn create<S: VectorStore>(
    ctx: &ServiceContext<S>,
    name: &str,
    model_id: Option<&str>,
    metadata: Map<String, Value>,
) -> ServiceResult<Map<String, Value>> {
    if name.trim().is_empty() {
        return Err(ServiceError::invalid("Collection name is required"));
    }

    let model_id = match model_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Err(ServiceError::invalid("embedding_model is required")),
    };

    let Some(dimension) = ctx.models.dimension(model_id) else {
        return Err(ServiceError::invalid(format!(
            "Unknown embedding_model '{model_id}'. Available: {}",
            ctx.models.model_ids().join(", ")
        )));
    };

    if ctx.store.collection_exists(name).await? {
        return Err(ServiceError::Conflict(format!(
            "Collection '{name}' already exists"
        )));
    }

    let mut stored = metadata;
    stored.insert(
        EMBEDDING_MODEL_KEY.to_string(),
        Value::String(model_id.to_string()),
    );
    stored.insert(
        DISTANCE_METRIC_KEY.to_string(),
        Value::String(DISTANCE_METRIC_COSINE.to_string()),
    );

    ctx.store
        .create_collection(name, dimension, stored.clone())
        .await?;

    info!(collection = name, model_id, dimension, "Created collection");
    Ok(stored)
}

pub async fn get<S: VectorStore>(
    ctx: &ServiceContext<S>,
    name: &str,
) -> ServiceResult<CollectionInfo> {
    let metadata = ctx.store.collection_metadata(name).await?;
    let count = ctx.store.count(name, None).await?;

    Ok(CollectionInfo {
        name: name.to_string(),
        count,
        metadata,
    })
}

/// Every collection sorted by name. Per-collection failures are reported inline.
pub async fn list<S: VectorStore>(
    ctx: &ServiceContext<S>,
) -> ServiceResult<Vec<CollectionSummary>> {
    let mut names = ctx.store.list_collections().await?;
    names.sort();

    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        let summary = match get(ctx, &name).await {
            Ok(info) => CollectionSummary {
                name: info.name,
                count: info.count,
                metadata: info.metadata,
                error: None,
            },
            Err(e) => {
                warn!(collection = %name, error = %e, "Failed to read collection details");
                CollectionSummary {
                    name,
                    count: 0,
                    metadata: Map::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Replaces (`merge = false`) or merges (`merge = true`) the collection metadata.
///
/// Reserved keys are carried over when omitted and may not be changed.
pub async fn update_metadata<S: VectorStore>(
    ctx: &ServiceContext<S>,
    name: &str,
    new_metadata: Map<String, Value>,
    merge: bool,
) -> ServiceResult<Map<String, Value>> {
    let existing = ctx.store.collection_metadata(name).await?;

    for (key, value) in new_metadata.iter().filter(|(k, _)| is_reserved_key(k)) {
        if existing.get(key) != Some(value) {
            return Err(ServiceError::invalid(format!(
                "'{key}' is fixed at creation and cannot be changed"
            )));
        }
    }

    let updated = if merge {
        let mut merged = existing;
        merged.extend(new_metadata);
        merged
    } else {
        let mut replaced = new_metadata;
        for key in RESERVED_METADATA_KEYS {
            if let Some(value) = existing.get(key) {
                replaced.insert(key.to_string(), value.clone());
            }
        }
        replaced
    };

    ctx.store
        .set_collection_metadata(name, updated.clone())
        .await?;

    info!(collection = name, merge, keys = updated.len(), "Updated collection metadata");
    Ok(updated)
}

/// Deletes the collection and all of its documents.
pub async fn delete<S: VectorStore>(ctx: &ServiceContext<S>, name: &str) -> ServiceResult<()> {
    ctx.store.delete_collection(name).await?;
    info!(collection = name, "Deleted collection");
    Ok(())
}

/// Finds the model a collection is bound to.
///
/// - NotFound: the collection does not exist.
/// - InvalidArgument: no `embedding_model` binding (legacy collection).
/// - ServiceUnavailable: the bound model is not loaded in this process.
pub async fn resolve_model<S: VectorStore>(
    ctx: &ServiceContext<S>,
    name: &str,
) -> ServiceResult<ResolvedModel> {
    let metadata = ctx.store.collection_metadata(name).await?;

    let model_id = match metadata.get(EMBEDDING_MODEL_KEY) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => {
            return Err(ServiceError::invalid(format!(
                "Collection '{name}' has no '{EMBEDDING_MODEL_KEY}' binding; \
                 recreate it with an embedding_model"
            )));
        }
    };

    if !ctx.models.contains(&model_id) {
        return Err(ServiceError::ServiceUnavailable(format!(
            "Embedding model '{model_id}' bound to collection '{name}' is not loaded"
        )));
    }

    debug!(collection = name, model_id = %model_id, "Resolved collection model");
    Ok(ResolvedModel { model_id, metadata })
}
