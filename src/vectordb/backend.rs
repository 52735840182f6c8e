use std::path::Path;

use serde_json::{Map, Value};

use super::client::QdrantStore;
use super::error::VectorDbError;
use super::memory::MemoryStore;
use super::model::{DocumentRecord, ScanCursor, ScanPage, SearchHit, StoredDocument};
use super::store::VectorStore;
use crate::filter::MetadataFilter;

#[derive(Clone)]
/// Engine chosen at startup.
pub enum StoreBackend {
    /// Remote Qdrant server.
    Qdrant(QdrantStore),
    /// In-process engine.
    Memory(MemoryStore),
}

impl StoreBackend {
    /// Qdrant if a URL is given, otherwise the in-process engine hydrated from `snapshot`.
    pub async fn from_config(
        qdrant_url: Option<&str>,
        snapshot: Option<&Path>,
    ) -> Result<Self, VectorDbError> {
        if let Some(url) = qdrant_url {
            return Ok(Self::Qdrant(QdrantStore::new(url).await?));
        }

        let store = MemoryStore::new();
        if let Some(path) = snapshot {
            store.load_snapshot(path)?;
        }
        Ok(Self::Memory(store))
    }

    /// Engine name for logs and health output.
    pub fn engine(&self) -> &'static str {
        match self {
            Self::Qdrant(_) => "qdrant",
            Self::Memory(_) => "memory",
        }
    }

    /// Persists in-process state; a no-op for Qdrant.
    pub fn persist(&self, snapshot: Option<&Path>) -> Result<(), VectorDbError> {
        match (self, snapshot) {
            (Self::Memory(store), Some(path)) => store.save_snapshot(path),
            _ => Ok(()),
        }
    }
}

impl VectorStore for StoreBackend {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.create_collection(name, dimension, metadata).await,
            Self::Memory(s) => s.create_collection(name, dimension, metadata).await,
        }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.collection_exists(name).await,
            Self::Memory(s) => s.collection_exists(name).await,
        }
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.list_collections().await,
            Self::Memory(s) => s.list_collections().await,
        }
    }

    async fn collection_metadata(&self, name: &str) -> Result<Map<String, Value>, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.collection_metadata(name).await,
            Self::Memory(s) => s.collection_metadata(name).await,
        }
    }

    async fn set_collection_metadata(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.set_collection_metadata(name, metadata).await,
            Self::Memory(s) => s.set_collection_metadata(name, metadata).await,
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.delete_collection(name).await,
            Self::Memory(s) => s.delete_collection(name).await,
        }
    }

    async fn count(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<u64, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.count(name, filter).await,
            Self::Memory(s) => s.count(name, filter).await,
        }
    }

    async fn upsert(
        &self,
        name: &str,
        documents: Vec<StoredDocument>,
    ) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.upsert(name, documents).await,
            Self::Memory(s) => s.upsert(name, documents).await,
        }
    }

    async fn delete_documents(&self, name: &str, ids: &[String]) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.delete_documents(name, ids).await,
            Self::Memory(s) => s.delete_documents(name, ids).await,
        }
    }

    async fn clear(&self, name: &str) -> Result<u64, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.clear(name).await,
            Self::Memory(s) => s.clear(name).await,
        }
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.search(name, vector, limit, filter).await,
            Self::Memory(s) => s.search(name, vector, limit, filter).await,
        }
    }

    async fn fetch(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<DocumentRecord>, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.fetch(name, filter, limit, offset).await,
            Self::Memory(s) => s.fetch(name, filter, limit, offset).await,
        }
    }

    async fn scan(
        &self,
        name: &str,
        cursor: Option<ScanCursor>,
        limit: u64,
    ) -> Result<ScanPage, VectorDbError> {
        match self {
            Self::Qdrant(s) => s.scan(name, cursor, limit).await,
            Self::Memory(s) => s.scan(name, cursor, limit).await,
        }
    }

    async fn health_check(&self) -> Result<(), VectorDbError> {
        match self {
            Self::Qdrant(s) => s.health_check().await,
            Self::Memory(s) => s.health_check().await,
        }
    }
}
