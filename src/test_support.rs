//! Shared fixtures for unit tests.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::ServiceContext;
use crate::embedding::Reranker;
use crate::models::ModelRegistry;
use crate::filter::MetadataFilter;
use crate::vectordb::{
    DocumentRecord, MemoryStore, ScanCursor, ScanPage, SearchHit, StoredDocument, VectorDbError,
    VectorStore,
};

pub const MODEL_LARGE: &str = "mxbai-large";
pub const MODEL_SMALL: &str = "all-minilm";

pub fn registry(with_reranker: bool) -> ModelRegistry {
    let mut builder = ModelRegistry::builder()
        .stub(MODEL_LARGE, 1024)
        .unwrap()
        .stub(MODEL_SMALL, 384)
        .unwrap();
    if with_reranker {
        builder = builder.reranker(Reranker::stub().unwrap());
    }
    builder.build().unwrap()
}

pub fn context() -> ServiceContext<MemoryStore> {
    ServiceContext::new(Arc::new(registry(true)), MemoryStore::new())
}

pub fn context_without_reranker() -> ServiceContext<MemoryStore> {
    ServiceContext::new(Arc::new(registry(false)), MemoryStore::new())
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Delegates to a [`MemoryStore`] but fails every per-collection read of `broken`.
#[derive(Clone)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub broken: String,
}

impl FlakyStore {
    fn check(&self, name: &str) -> Result<(), VectorDbError> {
        if name == self.broken {
            return Err(VectorDbError::ReadFailed {
                collection: name.to_string(),
                message: "simulated engine failure".to_string(),
            });
        }
        Ok(())
    }
}

impl VectorStore for FlakyStore {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        self.inner.create_collection(name, dimension, metadata).await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        self.check(name)?;
        self.inner.collection_exists(name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        self.inner.list_collections().await
    }

    async fn collection_metadata(&self, name: &str) -> Result<Map<String, Value>, VectorDbError> {
        self.check(name)?;
        self.inner.collection_metadata(name).await
    }

    async fn set_collection_metadata(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        self.check(name)?;
        self.inner.set_collection_metadata(name, metadata).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.inner.delete_collection(name).await
    }

    async fn count(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<u64, VectorDbError> {
        self.check(name)?;
        self.inner.count(name, filter).await
    }

    async fn upsert(
        &self,
        name: &str,
        documents: Vec<StoredDocument>,
    ) -> Result<(), VectorDbError> {
        self.check(name)?;
        self.inner.upsert(name, documents).await
    }

    async fn delete_documents(&self, name: &str, ids: &[String]) -> Result<(), VectorDbError> {
        self.inner.delete_documents(name, ids).await
    }

    async fn clear(&self, name: &str) -> Result<u64, VectorDbError> {
        self.inner.clear(name).await
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        self.check(name)?;
        self.inner.search(name, vector, limit, filter).await
    }

    async fn fetch(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<DocumentRecord>, VectorDbError> {
        self.check(name)?;
        self.inner.fetch(name, filter, limit, offset).await
    }

    async fn scan(
        &self,
        name: &str,
        cursor: Option<ScanCursor>,
        limit: u64,
    ) -> Result<ScanPage, VectorDbError> {
        self.check(name)?;
        self.inner.scan(name, cursor, limit).await
    }

    async fn health_check(&self) -> Result<(), VectorDbError> {
        self.inner.health_check().await
    }
}

pub fn flaky_context(broken: &str) -> ServiceContext<FlakyStore> {
    ServiceContext::new(
        Arc::new(registry(false)),
        FlakyStore {
            inner: MemoryStore::new(),
            broken: broken.to_string(),
        },
    )
}
