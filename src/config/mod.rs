//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `RAGDOCK_*` environment variables. The model
//! manifest is the one setting without a default: the server refuses to start without it.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RAGDOCK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5006`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Path to the JSON model manifest (required).
    pub model_manifest: Option<PathBuf>,

    /// Path to the reranker model directory (BERT + tokenizer). Overrides the manifest.
    pub reranker_path: Option<PathBuf>,

    /// Qdrant endpoint URL. When unset the in-process engine is used.
    pub qdrant_url: Option<String>,

    /// Snapshot file for the in-process engine.
    pub storage_path: Option<PathBuf>,
}

/// Default port, kept from the service this backend replaces.
pub const DEFAULT_PORT: u16 = 5006;

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            model_manifest: None,
            reranker_path: None,
            qdrant_url: None,
            storage_path: None,
        }
    }
}

impl Config {
    pub const ENV_PORT: &'static str = "RAGDOCK_PORT";
    pub const ENV_BIND_ADDR: &'static str = "RAGDOCK_BIND_ADDR";
    pub const ENV_MODEL_MANIFEST: &'static str = "RAGDOCK_MODEL_MANIFEST";
    pub const ENV_RERANKER_PATH: &'static str = "RAGDOCK_RERANKER_PATH";
    pub const ENV_QDRANT_URL: &'static str = "RAGDOCK_QDRANT_URL";
    pub const ENV_STORAGE_PATH: &'static str = "RAGDOCK_STORAGE_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let model_manifest = Self::parse_optional_path_from_env(Self::ENV_MODEL_MANIFEST);
        let reranker_path = Self::parse_optional_path_from_env(Self::ENV_RERANKER_PATH);
        let qdrant_url = Self::parse_optional_string_from_env(Self::ENV_QDRANT_URL);
        let storage_path = Self::parse_optional_path_from_env(Self::ENV_STORAGE_PATH);

        Ok(Self {
            port,
            bind_addr,
            model_manifest,
            reranker_path,
            qdrant_url,
            storage_path,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let manifest = self
            .model_manifest
            .as_ref()
            .ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_MODEL_MANIFEST,
            })?;

        if !manifest.exists() {
            return Err(ConfigError::PathNotFound {
                path: manifest.clone(),
            });
        }
        if !manifest.is_file() {
            return Err(ConfigError::NotAFile {
                path: manifest.clone(),
            });
        }

        if let Some(ref path) = self.reranker_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.storage_path
            && path.is_dir()
        {
            return Err(ConfigError::NotAFile { path: path.clone() });
        }

        if self.qdrant_url.is_some() && self.storage_path.is_some() {
            return Err(ConfigError::ConflictingSettings {
                first: Self::ENV_QDRANT_URL,
                second: Self::ENV_STORAGE_PATH,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
