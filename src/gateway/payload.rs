//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collections::CollectionSummary;
use crate::ingest::NewDocument;
use crate::rerank::{RerankCandidate, RerankedItem};
use crate::vectordb::{DocumentRecord, SearchHit};

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub embedding_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMetadataRequest {
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MergeParams {
    #[serde(default)]
    pub merge: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentsRequest {
    #[serde(default)]
    pub documents: Vec<NewDocument>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentsRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsParams {
    /// JSON-encoded filter.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetadataValuesParams {
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub top_k: Option<u64>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RerankBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub documents: Vec<RerankCandidate>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub collections_count: usize,
    pub embedding_models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_encoder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnhealthyResponse {
    pub status: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionSummary>,
}

/// `{status, name, metadata}` for create and metadata updates.
#[derive(Debug, Serialize)]
pub struct CollectionChanged {
    pub status: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsAdded {
    pub status: &'static str,
    pub collection: String,
    pub count: usize,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsDeleted {
    pub status: &'static str,
    pub collection: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CollectionEmptied {
    pub status: &'static str,
    pub collection: String,
    pub count_deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<DocumentRecord>,
    pub count: usize,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct MetadataValuesResponse {
    pub field: String,
    pub values: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct QueryResults {
    pub results: Vec<SearchHit>,
    pub collection_metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct RerankResponse {
    pub reranked: Vec<RerankedItem>,
}
