//! Cross-cutting, shared constants.
//!
//! The two reserved metadata keys are written into every collection at creation and are
//! the only part of the persisted state this crate owns; everything else belongs to the
//! storage engine.

/// Reserved collection metadata key holding the bound embedding model id.
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";

/// Reserved collection metadata key holding the distance metric.
pub const DISTANCE_METRIC_KEY: &str = "distance_metric";

/// The only distance metric collections are created with.
pub const DISTANCE_METRIC_COSINE: &str = "cosine";

/// Keys a metadata update may never remove or change.
pub const RESERVED_METADATA_KEYS: [&str; 2] = [EMBEDDING_MODEL_KEY, DISTANCE_METRIC_KEY];

/// Prefix of server-generated document ids (`doc_<uuid>`).
pub const GENERATED_ID_PREFIX: &str = "doc_";

/// Default number of hits returned by `/query`.
pub const DEFAULT_QUERY_TOP_K: u64 = 3;

/// Default page size for document listing.
pub const DEFAULT_DOCUMENTS_LIMIT: u64 = 100;

/// Hard cap on the page size for document listing.
pub const MAX_DOCUMENTS_LIMIT: u64 = 1000;

/// Output dimension of stub embedders when the manifest does not set one.
pub const DEFAULT_STUB_DIMENSION: usize = 384;

/// Max tokens fed to embedding models.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Returns `true` if `key` is one of [`RESERVED_METADATA_KEYS`].
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_METADATA_KEYS.contains(&key)
}

/// Error returned when a vector does not have the bound model's dimensionality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl std::fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dimension mismatch: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// ```
/// use ragdock::constants::validate_embedding_dim;
///
/// validate_embedding_dim(384, 384).unwrap();
/// assert!(validate_embedding_dim(768, 384).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimensionMismatch> {
    if actual != expected {
        return Err(DimensionMismatch { expected, actual });
    }
    Ok(())
}
