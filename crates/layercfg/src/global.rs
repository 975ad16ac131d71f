//! Process-wide configuration accessor.
//!
//! One [`Config`] backed by the filesystem and the process environment lives
//! behind a single lock; every call, bootstrap included, runs under it.
//! Computed properties are evaluated after the lock is released, against a
//! snapshot of the tree, so an evaluator may itself read through this module.
//!
//! ```no_run
//! let host = layercfg::global::get_or("redis.host", "localhost")?;
//! if layercfg::global::is_production() {
//!     // ...
//! }
//! # Ok::<(), layercfg::ConfigError>(())
//! ```

use crate::error::ConfigError;
use crate::loader::{ConfigLayer, LoadOptions};
use crate::path::get_path;
use crate::store::{self, Config};
use crate::value::{Mapping, Value};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

/// Run `f` with exclusive access to the process-wide config.
///
/// `f` runs under the lock: it must not call back into this module.
pub fn with<R>(f: impl FnOnce(&mut Config) -> R) -> R {
    f(&mut GLOBAL.lock())
}

/// Swap in `config` as the process-wide config, returning the previous one.
pub fn install(config: Config) -> Config {
    std::mem::replace(&mut *GLOBAL.lock(), config)
}

/// Clear the process-wide config so the next access bootstraps again.
pub fn reset() {
    GLOBAL.lock().reset();
}

/// Run the bootstrap now if it has not run yet.
pub fn load() -> Result<(), ConfigError> {
    GLOBAL.lock().load()
}

/// Bootstrapped tree, shared. The guard is dropped before this returns.
fn snapshot() -> Result<Arc<Mapping>, ConfigError> {
    GLOBAL.lock().snapshot()
}

pub fn get(key: &str) -> Result<Option<Value>, ConfigError> {
    let tree = snapshot()?;
    Ok(get_path(&tree, key))
}

pub fn get_or(key: &str, default: impl Into<Value>) -> Result<Value, ConfigError> {
    Ok(get(key)?.unwrap_or_else(|| default.into()))
}

pub fn get_as<T: DeserializeOwned>(key: &str) -> Result<Option<T>, ConfigError> {
    get(key)?.map(|value| store::decode(key, value)).transpose()
}

pub fn set(key: &str, value: impl Into<Value>) -> Result<Option<Value>, ConfigError> {
    let before = GLOBAL.lock().replace(key, value.into())?;
    Ok(get_path(&before, key))
}

pub fn set_all(values: Mapping) -> Result<(), ConfigError> {
    GLOBAL.lock().set_all(values)
}

pub fn merge(values: Mapping) -> Result<(), ConfigError> {
    GLOBAL.lock().merge(values)
}

pub fn assign(values: Mapping) -> Result<(), ConfigError> {
    GLOBAL.lock().assign(values)
}

pub fn delete(key: &str) -> Result<(), ConfigError> {
    GLOBAL.lock().delete(key)
}

pub fn file(path: impl AsRef<Path>, options: LoadOptions) -> Result<(), ConfigError> {
    GLOBAL.lock().file(path, options)
}

pub fn read(key: &str) -> Result<Option<Arc<[u8]>>, ConfigError> {
    let tree = {
        let mut config = GLOBAL.lock();
        if let Some(cached) = config.cached_read(key)? {
            return Ok(cached);
        }
        config.snapshot()?
    };
    let value = get_path(&tree, key);
    Ok(GLOBAL.lock().read_value(key, value))
}

/// Copy of the whole tree.
pub fn tree() -> Result<Mapping, ConfigError> {
    Ok(Mapping::clone(&*snapshot()?))
}

pub fn layers() -> Vec<ConfigLayer> {
    GLOBAL.lock().layers().to_vec()
}

pub fn env() -> String {
    GLOBAL.lock().env()
}

pub fn get_env() -> String {
    env()
}

pub fn is_production() -> bool {
    GLOBAL.lock().environment().is_production()
}

pub fn is_prod() -> bool {
    is_production()
}

pub fn is_staging() -> bool {
    GLOBAL.lock().environment().is_staging()
}

pub fn is_production_like() -> bool {
    GLOBAL.lock().environment().is_production_like()
}

pub fn is_prod_like() -> bool {
    is_production_like()
}

pub fn is_test() -> bool {
    GLOBAL.lock().environment().is_test()
}

pub fn is_dev() -> bool {
    GLOBAL.lock().environment().is_dev()
}

pub fn is_development() -> bool {
    is_dev()
}

pub fn is_ci() -> bool {
    GLOBAL.lock().environment().is_ci()
}
