//! Embedding + model utilities.
//!
//! - [`embedder`] turns text into vectors for storage and search.
//! - [`reranker`] provides cross-encoder scoring of (query, text) pairs.

/// BERT encoder/classifier wrappers.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Sentence embedder.
pub mod embedder;
mod error;
/// Cross-encoder reranker.
pub mod reranker;
/// Tokenizer/model loading helpers.
pub mod utils;

pub use embedder::{Embedder, EmbedderConfig, TextEmbedder, normalize};
pub use error::EmbeddingError;
pub use reranker::{Reranker, RerankerConfig, RerankerError};
