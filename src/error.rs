//! Service-level error taxonomy shared by every pipeline.
//!
//! Lower layers keep their own error enums; they are folded into [`ServiceError`] at the
//! pipeline boundary so the gateway only has five cases to map onto HTTP.

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::filter::FilterError;
use crate::models::RegistryError;
use crate::vectordb::VectorDbError;

/// Result alias used by the pipelines.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing fields, unregistered model id, malformed filter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown collection (or unknown model id in the registry).
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate collection name.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A required model or reranker is not loaded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Unexpected engine or runtime failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn collection_not_found(name: &str) -> Self {
        Self::NotFound(format!("Collection '{name}' not found"))
    }

    /// Short machine-readable kind, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<VectorDbError> for ServiceError {
    fn from(err: VectorDbError) -> Self {
        match err {
            VectorDbError::CollectionNotFound { collection } => {
                Self::collection_not_found(&collection)
            }
            VectorDbError::CollectionExists { collection } => {
                Self::Conflict(format!("Collection '{collection}' already exists"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<FilterError> for ServiceError {
    fn from(err: FilterError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<EmbeddingError> for ServiceError {
    fn from(err: EmbeddingError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ModelNotFound { .. } => Self::NotFound(err.to_string()),
            RegistryError::RerankerNotLoaded => Self::ServiceUnavailable(err.to_string()),
            RegistryError::Embedding(e) => Self::Internal(e.to_string()),
            RegistryError::Reranker(e) => Self::Internal(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_not_found_maps_to_not_found() {
        let err: ServiceError = VectorDbError::CollectionNotFound {
            collection: "ghost".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m.contains("ghost")));
    }

    #[test]
    fn test_engine_exists_maps_to_conflict() {
        let err: ServiceError = VectorDbError::CollectionExists {
            collection: "recipes".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_other_engine_errors_map_to_internal() {
        let err: ServiceError = VectorDbError::SearchFailed {
            collection: "recipes".to_string(),
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn test_reranker_not_loaded_maps_to_unavailable() {
        let err: ServiceError = RegistryError::RerankerNotLoaded.into();
        assert!(matches!(err, ServiceError::ServiceUnavailable(_)));
    }
}
