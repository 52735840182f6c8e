use std::path::PathBuf;

/// Max tokens of a (query, candidate) pair fed to the cross-encoder.
pub const MAX_SEQ_LEN: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct RerankerConfig {
    /// Model directory; `None` runs the lexical stub scorer.
    pub model_path: Option<PathBuf>,
}

impl RerankerConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
        }
    }

    pub fn stub() -> Self {
        Self { model_path: None }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
