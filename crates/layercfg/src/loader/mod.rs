//! Layered configuration loading.
//!
//! Resolves the default layer files under a root directory, reads them
//! through a [`FileSource`], strips environment override blocks and merges the
//! result into the configuration tree.

mod merge;
mod overlay;
mod source;


pub use merge::{assign, deep_merge};
pub(crate) use overlay::LoadDescriptor;
pub use source::{FileSource, FsSource, MemorySource};

use std::path::{Path, PathBuf};

/// Base name of layer files under the root.
const DEFAULT_CONFIG_STEM: &str = "config";
/// Extension of layer files.
const DEFAULT_CONFIG_EXTENSION: &str = "json5";
/// Directory holding untracked, local-only layers.
const PRIVATE_CONFIG_DIR: &str = "private";

/// Prefix of the reserved key holding an environment-specific override block.
pub const ENV_OVERRIDE_PREFIX: &str = "$env_";
/// Reserved tree key naming one more private config file to load at bootstrap.
pub const PRIVATE_CONFIG_FILE_KEY: &str = "$privateConfigFile";

/// Options for loading a single config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Swallow every load failure, including "not found".
    pub ignore_errors: bool,
    /// Swallow "not found" only.
    pub ignore_not_found: bool,
    /// Replace the whole tree instead of merging into it.
    pub overwrite: bool,
}

impl LoadOptions {
    /// Options used by bootstrap: a missing file is not an error.
    pub fn ignore_not_found() -> Self {
        Self {
            ignore_not_found: true,
            ..Self::default()
        }
    }

    pub fn ignore_errors() -> Self {
        Self {
            ignore_errors: true,
            ..Self::default()
        }
    }

    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn with_ignore_not_found(mut self, ignore_not_found: bool) -> Self {
        self.ignore_not_found = ignore_not_found;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Origin of a layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `config.json5` under the root.
    Default,
    /// `config.<env>.json5` under the root.
    Environment,
    /// `private/config.json5` under the root.
    Private,
    /// `private/config.<env>.json5` under the root.
    PrivateEnvironment,
    /// File named by the `$privateConfigFile` key.
    PrivateConfigFile,
    /// `CFG__` environment variables (highest bootstrap precedence).
    EnvVars,
    /// Explicit `file` call after bootstrap.
    Runtime,
}

/// Metadata about a layer considered during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk, if the layer is file-backed.
    pub path: Option<PathBuf>,
    /// Whether the layer contributed to the tree.
    pub applied: bool,
}

/// Default file layers for `root` and `env`, lowest precedence first.
pub(crate) fn default_layers(root: &Path, env: &str) -> [(ConfigLayerSource, PathBuf); 4] {
    let private = root.join(PRIVATE_CONFIG_DIR);
    [
        (ConfigLayerSource::Default, root.join(layer_file_name(None))),
        (
            ConfigLayerSource::Environment,
            root.join(layer_file_name(Some(env))),
        ),
        (
            ConfigLayerSource::Private,
            private.join(layer_file_name(None)),
        ),
        (
            ConfigLayerSource::PrivateEnvironment,
            private.join(layer_file_name(Some(env))),
        ),
    ]
}

fn layer_file_name(env: Option<&str>) -> String {
    match env {
        Some(env) => format!("{DEFAULT_CONFIG_STEM}.{env}.{DEFAULT_CONFIG_EXTENSION}"),
        None => format!("{DEFAULT_CONFIG_STEM}.{DEFAULT_CONFIG_EXTENSION}"),
    }
}
