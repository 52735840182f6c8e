//! Storage engines behind the [`VectorStore`] seam.
//!
//! - [`QdrantStore`]: remote Qdrant server, collection metadata kept in a catalog collection.
//! - [`MemoryStore`]: in-process engine with an optional JSON snapshot.
//! - [`StoreBackend`]: the one picked at startup.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod model;
pub mod store;


pub use backend::StoreBackend;
pub use client::{CATALOG_COLLECTION, QdrantStore};
pub use error::VectorDbError;
pub use memory::MemoryStore;
pub use model::{
    DocumentRecord, ScanCursor, ScanPage, SearchHit, StoredDocument, cosine_similarity,
};
pub use store::VectorStore;
