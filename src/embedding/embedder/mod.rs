//! Text embedder (BERT sentence encoder + tokenizer).
//!
//! Use [`EmbedderConfig::stub`] for tests and model-less deployments. The stub hashes
//! lowercase word tokens into buckets, so texts sharing words land close together; it is
//! deterministic but carries no semantics beyond word overlap.

/// Embedder configuration.
pub mod config;

#[cfg(test)]
mod tests;

pub use config::EmbedderConfig;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertEmbeddingModel;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::load_tokenizer_with_truncation;
use crate::hashing::hash_to_u64;

/// Text → vector runtime, the seam the model registry is built on.
///
/// Implementations must be deterministic for a given input and always return vectors of
/// [`dimension`](Embedder::dimension) floats.
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Output dimensionality, fixed at load time.
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts in one call. All-or-nothing.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::InferenceFailed {
                reason: "embedder returned no vector".to_string(),
            })
    }

    /// Returns `true` if running without model weights.
    fn is_stub(&self) -> bool {
        false
    }
}

enum EmbedderBackend {
    Model {
        model: BertEmbeddingModel,
        tokenizer: Tokenizer,
        device: Device,
    },
    Stub,
}

/// Embedding generator backed by a BERT encoder (supports stub mode).
pub struct TextEmbedder {
    backend: EmbedderBackend,
    dimension: usize,
    config: EmbedderConfig,
}

impl std::fmt::Debug for TextEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("dimension", &self.dimension)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl TextEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(
                dimension = config.stub_dimension,
                "Embedder running in STUB mode"
            );
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                dimension: config.stub_dimension,
                config,
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for embedder");

        let model = BertEmbeddingModel::load(&config.model_path, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT encoder: {}", e),
            }
        })?;

        let tokenizer = load_tokenizer_with_truncation(&config.model_path, config.max_seq_len)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        let dimension = model.hidden_size();

        info!(
            model_path = %config.model_path.display(),
            dimension,
            max_seq_len = config.max_seq_len,
            "Embedding model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            },
            dimension,
            config,
        })
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &BertEmbeddingModel,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Generating embedding (encoder forward pass)"
        );

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = model
            .forward_pooled(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Encoder forward pass failed: {}", e),
            })?;

        let embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;

        Ok(normalize(embedding))
    }

    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let lower = text.to_lowercase();
        let mut tokens = 0usize;

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (hash_to_u64(token.as_bytes()) % self.dimension as u64) as usize;
            embedding[bucket] += 1.0;
            tokens += 1;
        }

        if tokens == 0 {
            // No word tokens: fall back to a pseudo-random vector seeded by the raw text.
            let mut state = hash_to_u64(text.as_bytes());
            for value in embedding.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        normalize(embedding)
    }
}

impl Embedder for TextEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            // Sequential: padded batching would change pooling for short inputs.
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => texts
                .iter()
                .map(|text| self.embed_with_model(text, model, tokenizer, device))
                .collect(),
            EmbedderBackend::Stub => Ok(texts.iter().map(|text| self.embed_stub(text)).collect()),
        }
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }
}

/// L2-normalizes in place; zero vectors are returned unchanged.
pub fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }

    embedding
}
