//! Document ingestion: validate, embed with the bound model, bulk-write.

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collections::resolve_model;
use crate::constants::{GENERATED_ID_PREFIX, validate_embedding_dim};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::vectordb::{StoredDocument, VectorStore};

/// A document as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl NewDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedDocuments {
    pub count: usize,
    pub ids: Vec<String>,
}

fn generate_id() -> String {
    format!("{GENERATED_ID_PREFIX}{}", Uuid::new_v4())
}

/// Embeds and writes `documents` into `collection`, all or nothing.
pub async fn add_documents<S: VectorStore>(
    ctx: &ServiceContext<S>,
    collection: &str,
    documents: Vec<NewDocument>,
) -> ServiceResult<AddedDocuments> {
    if documents.is_empty() {
        return Err(ServiceError::invalid("No documents provided"));
    }
    if let Some(idx) = documents
        .iter()
        .position(|d| d.text.as_deref().is_none_or(str::is_empty))
    {
        return Err(ServiceError::invalid(format!(
            "Document at index {idx} is missing 'text'"
        )));
    }
    let mut seen = HashSet::with_capacity(documents.len());
    for (idx, doc) in documents.iter().enumerate() {
        if let Some(id) = doc.id.as_deref().filter(|id| !id.is_empty())
            && !seen.insert(id)
        {
            return Err(ServiceError::invalid(format!(
                "Document at index {idx} repeats id '{id}'"
            )));
        }
    }

    let resolved = resolve_model(ctx, collection).await?;

    let mut ids = Vec::with_capacity(documents.len());
    let mut texts = Vec::with_capacity(documents.len());
    let mut metadatas = Vec::with_capacity(documents.len());
    for doc in documents {
        let id = match doc.id {
            Some(id) if !id.is_empty() => id,
            _ => generate_id(),
        };
        ids.push(id);
        texts.push(doc.text.unwrap_or_default());
        metadatas.push(doc.metadata.unwrap_or_default());
    }

    let vectors = ctx.embed_batch(&resolved.model_id, texts.clone()).await?;

    let expected = ctx.models.dimension(&resolved.model_id).ok_or_else(|| {
        ServiceError::ServiceUnavailable(format!("model '{}' unloaded", resolved.model_id))
    })?;
    if vectors.len() != texts.len() {
        return Err(ServiceError::Internal(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    for vector in &vectors {
        validate_embedding_dim(vector.len(), expected)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
    }

    let records: Vec<StoredDocument> = ids
        .iter()
        .cloned()
        .zip(texts)
        .zip(metadatas)
        .zip(vectors)
        .map(|(((id, text), metadata), vector)| StoredDocument {
            id,
            text,
            metadata,
            vector,
        })
        .collect();

    debug!(collection, documents = records.len(), "Writing documents");
    ctx.store.upsert(collection, records).await?;

    info!(
        collection,
        model_id = %resolved.model_id,
        count = ids.len(),
        "Added documents"
    );

    Ok(AddedDocuments {
        count: ids.len(),
        ids,
    })
}

/// Deletes documents by id. Returns how many ids were requested.
pub async fn delete_documents<S: VectorStore>(
    ctx: &ServiceContext<S>,
    collection: &str,
    ids: Vec<String>,
) -> ServiceResult<usize> {
    if ids.is_empty() {
        return Err(ServiceError::invalid("No document ids provided"));
    }
    if !ctx.store.collection_exists(collection).await? {
        return Err(ServiceError::collection_not_found(collection));
    }

    ctx.store.delete_documents(collection, &ids).await?;

    info!(collection, count = ids.len(), "Deleted documents");
    Ok(ids.len())
}

/// Removes every document but keeps the collection. Returns the number removed.
pub async fn empty<S: VectorStore>(
    ctx: &ServiceContext<S>,
    collection: &str,
) -> ServiceResult<u64> {
    let deleted = ctx.store.clear(collection).await?;
    info!(collection, deleted, "Emptied collection");
    Ok(deleted)
}
