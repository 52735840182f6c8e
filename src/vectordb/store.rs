use std::future::Future;

use serde_json::{Map, Value};

use super::error::VectorDbError;
use super::model::{DocumentRecord, ScanCursor, ScanPage, SearchHit, StoredDocument};
use crate::filter::MetadataFilter;

/// Storage engine seam: named namespaces of vectors plus text and metadata.
///
/// Every operation on a missing collection fails with
/// [`VectorDbError::CollectionNotFound`].
pub trait VectorStore: Send + Sync {
    /// Creates a cosine-distance namespace with `dimension`-sized vectors.
    /// Fails with [`VectorDbError::CollectionExists`] if the name is taken.
    fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metadata: Map<String, Value>,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// `Ok(false)` only for true absence; engine failures are errors.
    fn collection_exists(&self, name: &str)
    -> impl Future<Output = Result<bool, VectorDbError>> + Send;

    /// Names of every collection, in no particular order.
    fn list_collections(&self) -> impl Future<Output = Result<Vec<String>, VectorDbError>> + Send;

    fn collection_metadata(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Map<String, Value>, VectorDbError>> + Send;

    /// Overwrites the stored collection metadata.
    fn set_collection_metadata(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    fn delete_collection(&self, name: &str)
    -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Number of documents matching `filter` (all documents if `None`).
    fn count(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
    ) -> impl Future<Output = Result<u64, VectorDbError>> + Send;

    /// Inserts or overwrites documents by id, in one call.
    fn upsert(
        &self,
        name: &str,
        documents: Vec<StoredDocument>,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Deletes documents by id. Unknown ids are ignored.
    fn delete_documents(
        &self,
        name: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Deletes every document, keeping the collection. Returns how many were removed.
    fn clear(&self, name: &str) -> impl Future<Output = Result<u64, VectorDbError>> + Send;

    /// Nearest neighbors, ascending by distance.
    fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&MetadataFilter>,
    ) -> impl Future<Output = Result<Vec<SearchHit>, VectorDbError>> + Send;

    /// A page of documents in engine order (stable for a given state).
    fn fetch(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = Result<Vec<DocumentRecord>, VectorDbError>> + Send;

    /// Walks the whole collection one page at a time. Pass `None` to start and the
    /// returned cursor to continue; each call reads only its own page.
    fn scan(
        &self,
        name: &str,
        cursor: Option<ScanCursor>,
        limit: u64,
    ) -> impl Future<Output = Result<ScanPage, VectorDbError>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<(), VectorDbError>> + Send;
}
