//! Ragdock library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Service
//! - [`ServiceContext`] - Model registry and storage engine shared by every pipeline
//! - [`ServiceError`] - Error taxonomy returned by the pipelines
//! - [`Config`], [`ConfigError`] - Server configuration
//!
//! ## Pipelines
//! - [`collections`] - Create, read, update and delete collections bound to a model
//! - [`ingest`] - Add, delete and empty documents
//! - [`query`] - Nearest-neighbour search with metadata filters
//! - [`rerank`] - Cross-encoder rerank of caller-supplied candidates
//! - [`introspect`] - Document paging and metadata value enumeration
//!
//! ## Models
//! - [`ModelRegistry`], [`ModelManifest`] - Embedding models and the optional reranker
//! - [`TextEmbedder`], [`Reranker`] - BERT-backed (or stub) inference
//!
//! ## Storage
//! - [`VectorStore`] - Storage engine seam
//! - [`StoreBackend`], [`QdrantStore`], [`MemoryStore`] - Engines
//! - [`MetadataFilter`] - Engine-neutral filter grammar

pub mod collections;
pub mod config;
pub mod constants;
pub mod context;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod hashing;
pub mod ingest;
pub mod introspect;
pub mod models;
pub mod query;
pub mod rerank;
pub mod vectordb;

#[cfg(test)]
mod test_support;

pub use config::{Config, ConfigError};
pub use constants::{
    DEFAULT_QUERY_TOP_K, DISTANCE_METRIC_COSINE, DISTANCE_METRIC_KEY, DimensionMismatch,
    EMBEDDING_MODEL_KEY, RESERVED_METADATA_KEYS, validate_embedding_dim,
};
pub use context::ServiceContext;
pub use embedding::{
    Embedder, EmbedderConfig, EmbeddingError, Reranker, RerankerConfig, RerankerError,
    TextEmbedder,
};
pub use error::{ServiceError, ServiceResult};
pub use filter::{FilterError, MetadataFilter};
pub use gateway::{HandlerState, create_router_with_state};
pub use models::{ModelManifest, ModelRegistry, RegistryError};
pub use vectordb::{
    DocumentRecord, MemoryStore, QdrantStore, ScanCursor, ScanPage, SearchHit, StoreBackend,
    StoredDocument, VectorDbError, VectorStore,
};
