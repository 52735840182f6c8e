use std::path::PathBuf;

use crate::constants::{DEFAULT_MAX_SEQ_LEN, DEFAULT_STUB_DIMENSION};
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::missing_model_files;

#[derive(Debug, Clone)]
/// Configuration for [`TextEmbedder`](super::TextEmbedder).
pub struct EmbedderConfig {
    /// Model directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_path: PathBuf,
    /// Max tokens to consider.
    pub max_seq_len: usize,
    /// Output dimension in stub mode. Real models report their own.
    pub stub_dimension: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            stub_dimension: DEFAULT_STUB_DIMENSION,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub(dimension: usize) -> Self {
        Self {
            stub_dimension: dimension,
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Validates required fields.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.testing_stub {
            if self.stub_dimension == 0 {
                return Err(EmbeddingError::InvalidConfig {
                    reason: "stub dimension must be greater than zero".to_string(),
                });
            }
            return Ok(());
        }

        if self.model_path.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_path.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }

        let missing = missing_model_files(&self.model_path);
        if !missing.is_empty() {
            return Err(EmbeddingError::ModelLoadFailed {
                reason: format!(
                    "missing {} in {}",
                    missing.join(", "),
                    self.model_path.display()
                ),
            });
        }

        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
