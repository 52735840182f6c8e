//! Model registry: named embedding models plus an optional cross-encoder.
//!
//! Built once at startup (from a [`ModelManifest`]) or directly in tests through
//! [`ModelRegistry::builder`]; immutable afterward and shared behind an `Arc`.

mod error;
mod manifest;


pub use error::RegistryError;
pub use manifest::{ModelEntry, ModelManifest, RerankerEntry};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::constants::DEFAULT_STUB_DIMENSION;
use crate::embedding::{Embedder, EmbedderConfig, Reranker, RerankerConfig, TextEmbedder};

/// Id reported for a reranker running without model weights.
pub const STUB_RERANKER_ID: &str = "stub";

#[derive(Debug)]
struct LoadedReranker {
    id: String,
    reranker: Arc<Reranker>,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Embedder>>,
    reranker: Option<LoadedReranker>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Loads every model named in the manifest at `manifest_path`.
    ///
    /// `reranker_override` takes precedence over the manifest's `reranker` entry.
    pub fn load(
        manifest_path: &Path,
        reranker_override: Option<&Path>,
    ) -> Result<Self, RegistryError> {
        let manifest = ModelManifest::from_file(manifest_path)?;
        Self::from_manifest(manifest, reranker_override)
    }

    pub fn from_manifest(
        manifest: ModelManifest,
        reranker_override: Option<&Path>,
    ) -> Result<Self, RegistryError> {
        manifest.validate()?;

        let mut builder = Self::builder();
        for entry in manifest.models {
            let config = match (&entry.path, entry.stub) {
                (_, true) => {
                    EmbedderConfig::stub(entry.dimension.unwrap_or(DEFAULT_STUB_DIMENSION))
                }
                (Some(path), false) => EmbedderConfig::new(path.clone()),
                (None, false) => return Err(RegistryError::MissingModelPath { id: entry.id }),
            };

            let embedder = TextEmbedder::load(config).map_err(|source| RegistryError::ModelLoad {
                id: entry.id.clone(),
                source,
            })?;

            info!(
                model_id = %entry.id,
                dimension = embedder.dimension(),
                stub = embedder.is_stub(),
                "Registered embedding model"
            );
            builder = builder.embedder(entry.id, embedder);
        }

        let reranker_config = match (reranker_override, manifest.reranker) {
            (Some(path), _) => Some(RerankerConfig::new(path)),
            (None, Some(entry)) if entry.stub => Some(RerankerConfig::stub()),
            (None, Some(RerankerEntry {
                path: Some(path), ..
            })) => Some(RerankerConfig::new(path)),
            (None, Some(_)) => {
                warn!("Manifest reranker entry has neither path nor stub, skipping");
                None
            }
            (None, None) => None,
        };

        if let Some(config) = reranker_config {
            let reranker = Reranker::load(config)?;
            info!(model_loaded = reranker.is_model_loaded(), "Registered cross-encoder");
            builder = builder.reranker(reranker);
        }

        builder.build()
    }

    /// Returns the embedder bound to `model_id`.
    pub fn embedder(&self, model_id: &str) -> Result<Arc<dyn Embedder>, RegistryError> {
        self.models
            .get(model_id)
            .cloned()
            .ok_or_else(|| RegistryError::ModelNotFound {
                id: model_id.to_string(),
            })
    }

    pub fn encode(&self, model_id: &str, text: &str) -> Result<Vec<f32>, RegistryError> {
        Ok(self.embedder(model_id)?.embed(text)?)
    }

    /// One model call for the whole batch.
    pub fn encode_batch(
        &self,
        model_id: &str,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>, RegistryError> {
        Ok(self.embedder(model_id)?.embed_batch(texts)?)
    }

    pub fn dimension(&self, model_id: &str) -> Option<usize> {
        self.models.get(model_id).map(|m| m.dimension())
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    /// Registered ids, sorted.
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// Model directory name of the reranker, or [`STUB_RERANKER_ID`].
    pub fn reranker_id(&self) -> Option<&str> {
        self.reranker.as_ref().map(|r| r.id.as_str())
    }

    pub fn reranker(&self) -> Result<Arc<Reranker>, RegistryError> {
        self.reranker
            .as_ref()
            .map(|r| Arc::clone(&r.reranker))
            .ok_or(RegistryError::RerankerNotLoaded)
    }

    pub fn score(&self, query: &str, text: &str) -> Result<f32, RegistryError> {
        Ok(self.reranker()?.score(query, text)?)
    }
}

#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    models: Vec<(String, Arc<dyn Embedder>)>,
    reranker: Option<Reranker>,
}

impl ModelRegistryBuilder {
    pub fn embedder(mut self, id: impl Into<String>, embedder: impl Embedder + 'static) -> Self {
        self.models.push((id.into(), Arc::new(embedder)));
        self
    }

    /// Registers a deterministic stub embedder.
    pub fn stub(self, id: impl Into<String>, dimension: usize) -> Result<Self, RegistryError> {
        let embedder = TextEmbedder::load(EmbedderConfig::stub(dimension))?;
        Ok(self.embedder(id, embedder))
    }

    pub fn reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn build(self) -> Result<ModelRegistry, RegistryError> {
        let mut models = HashMap::with_capacity(self.models.len());
        for (id, embedder) in self.models {
            if id.trim().is_empty() {
                return Err(RegistryError::EmptyModelId);
            }
            if models.contains_key(&id) {
                return Err(RegistryError::DuplicateModelId { id });
            }
            models.insert(id, embedder);
        }

        let reranker = self.reranker.map(|reranker| {
            let id = reranker
                .config()
                .model_path
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| STUB_RERANKER_ID.to_string());
            LoadedReranker {
                id,
                reranker: Arc::new(reranker),
            }
        });

        Ok(ModelRegistry { models, reranker })
    }
}
