use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::RegistryError;

/// Startup description of the models to load.
///
/// ```json
/// {
///   "models": [
///     {"id": "mxbai-large", "path": "/models/mxbai-embed-large-v1"},
///     {"id": "tiny", "stub": true, "dimension": 64}
///   ],
///   "reranker": {"path": "/models/ms-marco-MiniLM-L-6-v2"}
/// }
/// ```
///
/// Relative paths resolve against the manifest's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelManifest {
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub reranker: Option<RerankerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub stub: bool,
    /// Only used by stubs; real models report their own.
    #[serde(default)]
    pub dimension: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RerankerEntry {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub stub: bool,
}

impl ModelManifest {
    /// Reads and validates a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Err(RegistryError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|e| RegistryError::ManifestRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut manifest = Self::parse(&raw)?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        Ok(manifest)
    }

    /// Parses and validates manifest JSON.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let manifest: Self =
            serde_json::from_str(raw).map_err(|e| RegistryError::ManifestInvalid {
                reason: e.to_string(),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.models.is_empty() {
            return Err(RegistryError::EmptyManifest);
        }

        let mut seen = HashSet::new();
        for entry in &self.models {
            if entry.id.trim().is_empty() {
                return Err(RegistryError::EmptyModelId);
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(RegistryError::DuplicateModelId {
                    id: entry.id.clone(),
                });
            }
            if !entry.stub && entry.path.is_none() {
                return Err(RegistryError::MissingModelPath {
                    id: entry.id.clone(),
                });
            }
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        for entry in &mut self.models {
            if let Some(path) = entry.path.as_mut() {
                resolve(path);
            }
        }
        if let Some(path) = self.reranker.as_mut().and_then(|r| r.path.as_mut()) {
            resolve(path);
        }
    }
}
