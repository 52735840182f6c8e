use std::path::PathBuf;

use thiserror::Error;

use crate::embedding::{EmbeddingError, RerankerError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("failed to read model manifest {}: {reason}", path.display())]
    ManifestRead { path: PathBuf, reason: String },

    #[error("malformed model manifest: {reason}")]
    ManifestInvalid { reason: String },

    #[error("model manifest lists no models")]
    EmptyManifest,

    #[error("model ids must be non-empty")]
    EmptyModelId,

    #[error("duplicate model id '{id}'")]
    DuplicateModelId { id: String },

    #[error("model '{id}' has no path and is not a stub")]
    MissingModelPath { id: String },

    #[error("failed to load model '{id}': {source}")]
    ModelLoad {
        id: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("embedding model '{id}' is not registered")]
    ModelNotFound { id: String },

    #[error("no cross-encoder model is loaded")]
    RerankerNotLoaded,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Reranker(#[from] RerankerError),
}
