//! IO seams for reading config layers and raw files.

use crate::SourceError;
use crate::value::Value;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Capability to resolve a path to config data or raw bytes.
pub trait FileSource: Send {
    /// Load and parse the config data stored at `path`.
    fn load(&self, path: &Path) -> Result<Value, SourceError>;
    /// Read the raw bytes stored at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError>;
}

/// Filesystem source; config files are parsed as JSON5.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn load(&self, path: &Path) -> Result<Value, SourceError> {
        debug!("loading config file (path={})", path.display());
        let contents = fs::read_to_string(path).map_err(not_found_or_read)?;
        let value: serde_json::Value = json5::from_str(&contents)?;
        Ok(Value::from(value))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        fs::read(path).map_err(not_found_or_read)
    }
}

fn not_found_or_read(err: std::io::Error) -> SourceError {
    if err.kind() == ErrorKind::NotFound {
        SourceError::NotFound
    } else {
        SourceError::ReadFailed(err)
    }
}

#[derive(Debug, Default)]
struct MemoryFiles {
    data: HashMap<PathBuf, Value>,
    bytes: HashMap<PathBuf, Vec<u8>>,
}

/// In-memory source. Clones share the same files, so a handle kept by the
/// caller can keep editing a source already handed to a [`crate::Config`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<Mutex<MemoryFiles>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register config data (which may contain computed values) at `path`.
    pub fn with_file(self, path: impl AsRef<Path>, value: impl Into<Value>) -> Self {
        self.insert_file(path, value);
        self
    }

    /// Register raw bytes returned by [`FileSource::read`] at `path`.
    pub fn with_bytes(self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert_bytes(path, bytes);
        self
    }

    pub fn insert_file(&self, path: impl AsRef<Path>, value: impl Into<Value>) {
        self.files
            .lock()
            .data
            .insert(path.as_ref().to_path_buf(), value.into());
    }

    pub fn insert_bytes(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .bytes
            .insert(path.as_ref().to_path_buf(), bytes.into());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock();
        files.data.remove(path.as_ref());
        files.bytes.remove(path.as_ref());
    }
}

impl FileSource for MemorySource {
    fn load(&self, path: &Path) -> Result<Value, SourceError> {
        self.files
            .lock()
            .data
            .get(path)
            .cloned()
            .ok_or(SourceError::NotFound)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        self.files
            .lock()
            .bytes
            .get(path)
            .cloned()
            .ok_or(SourceError::NotFound)
    }
}
