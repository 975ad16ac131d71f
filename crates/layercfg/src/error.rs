//! Error types for config loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the configuration accessor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `file` was given a relative path.
    #[error("config path must be absolute: {}", .0.display())]
    InvalidPath(PathBuf),
    /// The requested config file does not exist.
    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    /// The config file exists but could not be loaded.
    #[error("failed to load config file {}: {source}", path.display())]
    FileLoad {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
    /// An earlier bootstrap failed; returned until the config is reset.
    #[error("config bootstrap failed earlier: {0}")]
    BootstrapFailed(String),
    /// The bootstrap root could not be resolved from the working directory.
    #[error("failed to resolve working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
    /// A stored value could not be decoded into the requested type.
    #[error("failed to decode config value at {key}: {source}")]
    DecodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// True when the error is the "file not found" kind of load failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::FileNotFound { .. })
    }
}

/// Errors returned by a [`crate::FileSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing exists at the path.
    #[error("file not found")]
    NotFound,
    /// Reading the file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing the file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The file parsed, but not to a mapping.
    #[error("expected a mapping at the top level, found {0}")]
    NotAMapping(&'static str),
}
