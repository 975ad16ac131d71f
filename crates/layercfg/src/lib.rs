//! Layered, environment-aware configuration accessor.
//!
//! This crate owns the in-memory configuration tree, the deep-merge rules used
//! to combine layers, and the lazy bootstrap that loads the default layer
//! stack (base file, environment file, private files, `CFG__` environment
//! variables) on first access.

mod env_vars;
mod environment;
mod error;
pub mod global;
mod loader;
mod path;
mod store;
mod value;

/// Environment variable ingestion helpers.
pub use env_vars::{ENV_PATH_SEPARATOR, ENV_PREFIX, decode_key, ingest};
/// Environment classification and injectable environment sources.
pub use environment::{
    CI_VAR, DEFAULT_ENVIRONMENT, ENV_NAME_VAR, EnvSource, Environment, MapEnv, ProcessEnv,
};
/// Public error types returned by config loading.
pub use error::{ConfigError, SourceError};
/// Layer loading types, merge helpers and file sources.
pub use loader::{
    ConfigLayer, ConfigLayerSource, ENV_OVERRIDE_PREFIX, FileSource, FsSource, LoadOptions,
    MemorySource, PRIVATE_CONFIG_FILE_KEY, assign, deep_merge,
};
/// Dotted-path accessors over a configuration tree.
pub use path::{get_path, remove_path, set_path};
/// The configuration service and its builder.
pub use store::{Config, ConfigBuilder};
/// Configuration value model.
pub use value::{Computed, Mapping, Value};
