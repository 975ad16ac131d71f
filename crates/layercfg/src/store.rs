//! The configuration service: tree, read cache and lazy bootstrap.

use crate::env_vars;
use crate::environment::{EnvSource, Environment, ProcessEnv};
use crate::error::{ConfigError, SourceError};
use crate::loader::{
    self, ConfigLayer, ConfigLayerSource, FileSource, FsSource, LoadDescriptor, LoadOptions,
    PRIVATE_CONFIG_FILE_KEY, assign, deep_merge,
};
use crate::path::{get_path, insert_path, remove_path, set_path};
use crate::value::{Mapping, Value};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How incoming data is combined with the tree.
#[derive(Debug, Clone, Copy)]
enum ApplyMode {
    Merge,
    Assign,
}

/// Process configuration: a merged tree plus a cache of files read through it.
///
/// Any read or write first runs the bootstrap (once): `config.json5`,
/// `config.<env>.json5`, `private/config.json5`,
/// `private/config.<env>.json5`, the file named by `$privateConfigFile`, then
/// `CFG__` environment variables. Later layers override earlier ones.
///
/// A failed bootstrap is sticky: the first access returns the underlying
/// error and every later access returns [`ConfigError::BootstrapFailed`]
/// until [`Config::reset`].
pub struct Config {
    tree: Arc<Mapping>,
    cache: HashMap<String, Option<Arc<[u8]>>>,
    loaded: bool,
    failure: Option<String>,
    layers: Vec<ConfigLayer>,
    root: Option<PathBuf>,
    files: Box<dyn FileSource>,
    environment: Environment,
}

/// Builder for a [`Config`] with injected sources.
pub struct ConfigBuilder {
    root: Option<PathBuf>,
    files: Box<dyn FileSource>,
    env: Box<dyn EnvSource>,
}

impl ConfigBuilder {
    /// Builder backed by the filesystem and the process environment.
    pub fn new() -> Self {
        Self {
            root: None,
            files: Box::new(FsSource),
            env: Box::new(ProcessEnv),
        }
    }

    /// Directory holding the default layers. Defaults to the working
    /// directory at bootstrap time.
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn file_source(mut self, files: impl FileSource + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    pub fn env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn build(self) -> Config {
        Config {
            tree: Arc::new(Mapping::new()),
            cache: HashMap::new(),
            loaded: false,
            failure: None,
            layers: Vec::new(),
            root: self.root,
            files: self.files,
            environment: Environment::from_boxed(self.env),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("loaded", &self.loaded)
            .field("failure", &self.failure)
            .field("root", &self.root)
            .field("environment", &self.environment)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Run the bootstrap now if it has not run yet.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        if let Some(failure) = &self.failure {
            return Err(ConfigError::BootstrapFailed(failure.clone()));
        }
        if self.loaded {
            return Ok(());
        }
        // Marked first: the layer loads below must not re-enter bootstrap.
        self.loaded = true;

        if let Err(err) = self.bootstrap() {
            warn!("config bootstrap failed: {err}");
            self.tree = Arc::new(Mapping::new());
            self.failure = Some(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    fn bootstrap(&mut self) -> Result<(), ConfigError> {
        let root = self.resolve_root()?;
        let env = self.environment.name();
        info!("bootstrapping config (root={}, env={env})", root.display());

        for (source, path) in loader::default_layers(&root, &env) {
            self.load_layer(source, &path, LoadOptions::ignore_not_found())?;
        }

        if let Some(Value::String(private)) = get_path(&self.tree, PRIVATE_CONFIG_FILE_KEY)
            && !private.is_empty()
        {
            let path = root.join(private);
            self.load_layer(
                ConfigLayerSource::PrivateConfigFile,
                &path,
                LoadOptions::ignore_not_found(),
            )?;
        }

        let applied = env_vars::ingest(Arc::make_mut(&mut self.tree), self.environment.vars());
        debug!("applied config variables (count={applied})");
        self.layers.push(ConfigLayer {
            source: ConfigLayerSource::EnvVars,
            path: None,
            applied: applied > 0,
        });

        let applied_layers = self.layers.iter().filter(|layer| layer.applied).count();
        info!("config bootstrap complete (layers={applied_layers})");
        Ok(())
    }

    /// Value at the dotted `key`, with computed properties evaluated.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>, ConfigError> {
        self.load()?;
        Ok(get_path(&self.tree, key))
    }

    /// Value at `key`, or `default` when any segment is missing.
    pub fn get_or(&mut self, key: &str, default: impl Into<Value>) -> Result<Value, ConfigError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    /// Decode the resolved value at `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)?.map(|value| decode(key, value)).transpose()
    }

    /// Assign `value` at the dotted `key`, returning what was there before.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ConfigError> {
        self.load()?;
        Ok(set_path(Arc::make_mut(&mut self.tree), key, value.into()))
    }

    /// Store `value` at `key` without evaluating anything, returning the tree
    /// as it was before the write.
    pub(crate) fn replace(&mut self, key: &str, value: Value) -> Result<Arc<Mapping>, ConfigError> {
        self.load()?;
        let before = Arc::clone(&self.tree);
        insert_path(Arc::make_mut(&mut self.tree), key, value);
        Ok(before)
    }

    /// Object form of `set`: same as [`Config::assign`].
    pub fn set_all(&mut self, values: Mapping) -> Result<(), ConfigError> {
        self.assign(values)
    }

    /// Deep-merge `values`, then its override block for the active environment.
    pub fn merge(&mut self, values: Mapping) -> Result<(), ConfigError> {
        self.load()?;
        self.apply(values, ApplyMode::Merge);
        Ok(())
    }

    /// Assign the top-level keys of `values`, then its override block for the
    /// active environment.
    pub fn assign(&mut self, values: Mapping) -> Result<(), ConfigError> {
        self.load()?;
        self.apply(values, ApplyMode::Assign);
        Ok(())
    }

    /// Remove the value at the dotted `key`.
    pub fn delete(&mut self, key: &str) -> Result<(), ConfigError> {
        self.load()?;
        remove_path(Arc::make_mut(&mut self.tree), key);
        Ok(())
    }

    /// Load the config file at the absolute `path` and merge it into the tree
    /// (or replace the tree with `overwrite`).
    pub fn file(
        &mut self,
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(ConfigError::InvalidPath(path.to_path_buf()));
        }
        self.load()?;
        self.load_layer(ConfigLayerSource::Runtime, path, options)?;
        Ok(())
    }

    /// Contents of the file whose path is stored at `key`, cached per key.
    ///
    /// A missing or falsy path, or a failed read, yields `None`; read failures
    /// are logged, never returned.
    pub fn read(&mut self, key: &str) -> Result<Option<Arc<[u8]>>, ConfigError> {
        if let Some(cached) = self.cached_read(key)? {
            return Ok(cached);
        }
        let value = get_path(&self.tree, key);
        Ok(self.read_value(key, value))
    }

    /// Result of an earlier `read` of `key`, if there was one.
    pub(crate) fn cached_read(
        &mut self,
        key: &str,
    ) -> Result<Option<Option<Arc<[u8]>>>, ConfigError> {
        self.load()?;
        Ok(self.cache.get(key).cloned())
    }

    /// Read the file named by `value`, the resolved value at `key`, and cache
    /// the outcome under `key`.
    pub(crate) fn read_value(&mut self, key: &str, value: Option<Value>) -> Option<Arc<[u8]>> {
        if let Some(cached) = self.cache.get(key) {
            return cached.clone();
        }
        let contents = self.read_file(key, value);
        self.cache.insert(key.to_string(), contents.clone());
        contents
    }

    fn read_file(&self, key: &str, value: Option<Value>) -> Option<Arc<[u8]>> {
        let value = value.filter(Value::is_truthy)?;
        let Some(path) = value.as_str() else {
            warn!(
                "config value is not a file path (key={key}, kind={})",
                value.kind()
            );
            return None;
        };
        let path = match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        };
        match self.files.read(&path) {
            Ok(bytes) => Some(Arc::from(bytes)),
            Err(err) => {
                warn!(
                    "failed to read file from config (key={key}, path={}): {err}",
                    path.display()
                );
                None
            }
        }
    }

    /// The whole tree. Read-only by convention.
    pub fn tree(&mut self) -> Result<&Mapping, ConfigError> {
        self.load()?;
        Ok(self.tree.as_ref())
    }

    /// Shared handle to the whole tree, with computed properties unevaluated.
    ///
    /// Later writes copy the tree instead of touching the snapshot.
    pub fn snapshot(&mut self) -> Result<Arc<Mapping>, ConfigError> {
        self.load()?;
        Ok(Arc::clone(&self.tree))
    }

    /// Bootstrap layers in load order, followed by the latest runtime `file`
    /// load, if any.
    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Active environment name.
    pub fn env(&self) -> String {
        self.environment.name()
    }

    /// Drop all state, a failed bootstrap included, so the next access
    /// bootstraps again.
    pub fn reset(&mut self) {
        self.tree = Arc::new(Mapping::new());
        self.cache.clear();
        self.layers.clear();
        self.loaded = false;
        self.failure = None;
    }

    /// Absolute bootstrap root; relative roots resolve against the working
    /// directory.
    fn resolve_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.root {
            Some(root) if root.is_absolute() => Ok(root.clone()),
            root => {
                let cwd = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
                Ok(match root {
                    Some(root) => cwd.join(root),
                    None => cwd,
                })
            }
        }
    }

    fn apply(&mut self, values: Mapping, mode: ApplyMode) {
        let env = self.environment.name();
        let (base, overlay) = LoadDescriptor::from_mapping(values).into_parts(&env);
        let combine: fn(&mut Mapping, &Mapping) = match mode {
            ApplyMode::Merge => deep_merge,
            ApplyMode::Assign => assign,
        };
        let tree = Arc::make_mut(&mut self.tree);
        combine(tree, &base);
        if let Some(overlay) = overlay {
            combine(tree, &overlay);
        }
    }

    fn load_layer(
        &mut self,
        source: ConfigLayerSource,
        path: &Path,
        options: LoadOptions,
    ) -> Result<(), ConfigError> {
        if !path.is_absolute() {
            return Err(ConfigError::InvalidPath(path.to_path_buf()));
        }
        let loaded = self.files.load(path).and_then(|value| match value {
            Value::Mapping(map) => Ok(map),
            other => Err(SourceError::NotAMapping(other.kind())),
        });

        let mapping = match loaded {
            Ok(mapping) => mapping,
            Err(SourceError::NotFound) if options.ignore_not_found || options.ignore_errors => {
                debug!("optional layer missing (source={source:?}, path={})", path.display());
                self.record_layer(source, path, false);
                return Ok(());
            }
            Err(SourceError::NotFound) => {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(err) if options.ignore_errors => {
                warn!(
                    "ignoring config load failure (source={source:?}, path={}): {err}",
                    path.display()
                );
                self.record_layer(source, path, false);
                return Ok(());
            }
            Err(err) => {
                return Err(ConfigError::FileLoad {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        if options.overwrite {
            debug!("replacing config tree (path={})", path.display());
            self.tree = Arc::new(Mapping::new());
        }
        self.apply(mapping, ApplyMode::Merge);
        debug!("loaded layer (source={source:?}, path={})", path.display());
        self.record_layer(source, path, true);
        Ok(())
    }

    /// Record a considered layer. Runtime loads replace the previous runtime
    /// entry, so repeated `file` calls keep the report bounded.
    fn record_layer(&mut self, source: ConfigLayerSource, path: &Path, applied: bool) {
        if source == ConfigLayerSource::Runtime {
            self.layers.retain(|layer| layer.source != ConfigLayerSource::Runtime);
        }
        self.layers.push(ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
            applied,
        });
    }
}

/// Decode a resolved value into `T`, naming `key` on failure.
pub(crate) fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value.to_json()).map_err(|source| ConfigError::DecodeFailed {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{ENV_NAME_VAR, MapEnv};
    use crate::loader::MemorySource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ROOT: &str = "/srv/app";

    fn mapping(json: serde_json::Value) -> Mapping {
        Value::from(json).into_mapping().expect("mapping")
    }

    fn memory_config(files: MemorySource, env: MapEnv) -> Config {
        Config::builder()
            .root(ROOT)
            .file_source(files)
            .env_source(env)
            .build()
    }

    /// Verify that dotted set/get creates and reads nested mappings.
    #[test]
    fn get_and_set_nested_values() {
        let mut config = memory_config(MemorySource::new(), MapEnv::new());
        assert_eq!(config.set("a.b", "c").expect("set"), None);

        assert_eq!(
            config.get("a").expect("get").map(|v| v.to_json()),
            Some(json!({"b": "c"}))
        );
        assert_eq!(config.get("a.b").expect("get"), Some(Value::from("c")));
        assert_eq!(
            config.get_or("a.b.c", "d").expect("get_or"),
            Value::from("d")
        );
        assert_eq!(
            config.set("a.b", "e").expect("set"),
            Some(Value::from("c"))
        );
    }

    /// Verify that the object form of set applies the active override block.
    #[test]
    fn set_all_applies_active_environment_block() {
        let env = MapEnv::new().with(ENV_NAME_VAR, "production");
        let mut config = memory_config(MemorySource::new(), env);
        config
            .set_all(mapping(json!({
                "featureX": false,
                "$env_production": {"featureX": true},
            })))
            .expect("set_all");

        assert_eq!(config.get("featureX").expect("get"), Some(Value::from(true)));
        assert_eq!(config.get("$env_production").expect("get"), None);
    }

    /// Verify that merge keeps nested siblings while assign replaces them.
    #[test]
    fn merge_and_assign_differ_on_nested_keys() {
        let mut config = memory_config(MemorySource::new(), MapEnv::new());
        config
            .merge(mapping(json!({"db": {"host": "a", "port": 1}})))
            .expect("merge");
        config
            .merge(mapping(json!({"db": {"host": "b"}})))
            .expect("merge");
        assert_eq!(
            config.get("db").expect("get").map(|v| v.to_json()),
            Some(json!({"host": "b", "port": 1}))
        );

        config
            .assign(mapping(json!({"db": {"host": "c"}})))
            .expect("assign");
        assert_eq!(
            config.get("db").expect("get").map(|v| v.to_json()),
            Some(json!({"host": "c"}))
        );
    }

    #[test]
    fn merge_applies_environment_block_after_base() {
        let env = MapEnv::new().with(ENV_NAME_VAR, "test");
        let mut config = memory_config(MemorySource::new(), env);
        config
            .merge(mapping(json!({
                "db": {"host": "prod-db", "pool": 10},
                "$env_test": {"db": {"host": "localhost"}},
                "$env_production": {"db": {"pool": 50}},
            })))
            .expect("merge");

        assert_eq!(
            config.tree().expect("tree").to_json(),
            json!({"db": {"host": "localhost", "pool": 10}})
        );
    }

    /// Verify that bootstrap runs on first access and never again.
    #[test]
    fn bootstrap_runs_once_on_first_access() {
        let files =
            MemorySource::new().with_file(format!("{ROOT}/config.json5"), json!({"name": "base"}));
        let mut config = memory_config(files.clone(), MapEnv::new());
        assert!(!config.is_loaded());

        assert_eq!(config.get("name").expect("get"), Some(Value::from("base")));
        assert!(config.is_loaded());

        files.insert_file(format!("{ROOT}/config.json5"), json!({"name": "changed"}));
        assert_eq!(config.get("name").expect("get"), Some(Value::from("base")));
    }

    /// Verify the precedence of the four file layers and `CFG__` variables.
    #[test]
    fn later_layers_override_earlier_ones() {
        let files = MemorySource::new()
            .with_file(
                format!("{ROOT}/config.json5"),
                json!({
                    "a": "default",
                    "b": "default",
                    "c": "default",
                    "d": "default",
                    "e": "default",
                }),
            )
            .with_file(
                format!("{ROOT}/config.staging.json5"),
                json!({"b": "env", "c": "env", "d": "env", "e": "env"}),
            )
            .with_file(
                format!("{ROOT}/private/config.json5"),
                json!({"c": "private", "d": "private", "e": "private"}),
            )
            .with_file(
                format!("{ROOT}/private/config.staging.json5"),
                json!({"d": "private-env", "e": "private-env"}),
            );
        let env = MapEnv::new()
            .with(ENV_NAME_VAR, "staging")
            .with("CFG__E", "var");
        let mut config = memory_config(files, env);

        assert_eq!(
            config.tree().expect("tree").to_json(),
            json!({"a": "default", "b": "env", "c": "private", "d": "private-env", "e": "var"})
        );
        let sources: Vec<_> = config.layers().iter().map(|layer| layer.source).collect();
        assert_eq!(
            sources,
            vec![
                ConfigLayerSource::Default,
                ConfigLayerSource::Environment,
                ConfigLayerSource::Private,
                ConfigLayerSource::PrivateEnvironment,
                ConfigLayerSource::EnvVars,
            ]
        );
    }

    /// Verify that `$privateConfigFile` pulls in one more layer.
    #[test]
    fn private_config_file_key_loads_one_more_layer() {
        let files = MemorySource::new()
            .with_file(
                format!("{ROOT}/config.json5"),
                json!({"$privateConfigFile": "/secrets/app.json5", "token": "public"}),
            )
            .with_file("/secrets/app.json5", json!({"token": "secret"}));
        let mut config = memory_config(files, MapEnv::new());

        assert_eq!(config.get("token").expect("get"), Some(Value::from("secret")));
        assert!(config.layers().iter().any(|layer| {
            layer.source == ConfigLayerSource::PrivateConfigFile && layer.applied
        }));
    }

    /// Verify that a failed bootstrap keeps failing instead of serving the
    /// layers that loaded before the error.
    #[test]
    fn failed_bootstrap_stays_failed_until_reset() {
        let files = MemorySource::new()
            .with_file(format!("{ROOT}/config.json5"), json!([1, 2]))
            .with_file(format!("{ROOT}/private/config.json5"), json!({"secret": "x"}));
        let env = MapEnv::new().with("CFG__DB__HOST", "prod-db");
        let mut config = memory_config(files.clone(), env);

        let err = config.get("db.host").expect_err("first access");
        assert!(matches!(
            err,
            ConfigError::FileLoad {
                source: SourceError::NotAMapping("sequence"),
                ..
            }
        ));
        assert!(matches!(
            config.get("db.host"),
            Err(ConfigError::BootstrapFailed(_))
        ));
        assert!(matches!(
            config.set("secret", "y"),
            Err(ConfigError::BootstrapFailed(_))
        ));
        assert!(config.tree().is_err());

        config.reset();
        files.insert_file(format!("{ROOT}/config.json5"), json!({"name": "fixed"}));
        assert_eq!(
            config.get("db.host").expect("get"),
            Some(Value::from("prod-db"))
        );
        assert_eq!(config.get("secret").expect("get"), Some(Value::from("x")));
    }

    /// Verify that an overwrite load replaces the tree and still applies the
    /// file's override block.
    #[test]
    fn file_overwrite_replaces_tree_and_keeps_env_block() {
        let env = MapEnv::new().with(ENV_NAME_VAR, "test");
        let files = MemorySource::new().with_file(
            "/etc/app/override.json5",
            json!({"test": "data", "$env_test": {"mode": "test"}}),
        );
        let mut config = memory_config(files, env);
        config.set("a.b", "c").expect("set");

        config
            .file("/etc/app/override.json5", LoadOptions::overwrite())
            .expect("file");
        assert_eq!(config.get("a.b").expect("get"), None);
        assert_eq!(
            config.tree().expect("tree").to_json(),
            json!({"test": "data", "mode": "test"})
        );
    }

    #[test]
    fn file_merges_computed_values_from_source() {
        let mut data = mapping(json!({"port": 8080}));
        data.insert(
            "url",
            Value::computed(|this| {
                let port = this.get("port").and_then(Value::as_i64).unwrap_or_default();
                Value::from(format!("http://localhost:{port}"))
            }),
        );
        let files = MemorySource::new().with_file("/etc/app/server.json5", data);
        let mut config = memory_config(files, MapEnv::new());

        config
            .file("/etc/app/server.json5", LoadOptions::default())
            .expect("file");
        config.set("port", 9000).expect("set");
        assert_eq!(
            config.get("url").expect("get"),
            Some(Value::from("http://localhost:9000"))
        );
    }

    /// Verify each combination of the not-found and error policies.
    #[test]
    fn file_error_policies() {
        let files = MemorySource::new().with_file("/etc/app/list.json5", json!([1, 2]));
        let mut config = memory_config(files, MapEnv::new());

        let err = config
            .file("/etc/app/missing.json5", LoadOptions::default())
            .expect_err("missing");
        assert!(err.is_not_found());
        config
            .file("/etc/app/missing.json5", LoadOptions::ignore_not_found())
            .expect("ignore not found");
        config
            .file("/etc/app/missing.json5", LoadOptions::ignore_errors())
            .expect("ignore errors");

        let err = config
            .file("/etc/app/list.json5", LoadOptions::ignore_not_found())
            .expect_err("not a mapping");
        assert!(matches!(
            err,
            ConfigError::FileLoad {
                source: SourceError::NotAMapping("sequence"),
                ..
            }
        ));
        config
            .file("/etc/app/list.json5", LoadOptions::ignore_errors())
            .expect("ignore errors");
    }

    /// Verify that repeated runtime loads keep a single runtime layer entry.
    #[test]
    fn runtime_layer_report_keeps_latest_load() {
        let files = MemorySource::new()
            .with_file("/etc/app/one.json5", json!({"one": 1}))
            .with_file("/etc/app/two.json5", json!({"two": 2}));
        let mut config = memory_config(files, MapEnv::new());

        for _ in 0..3 {
            config
                .file("/etc/app/one.json5", LoadOptions::default())
                .expect("file");
        }
        config
            .file("/etc/app/two.json5", LoadOptions::default())
            .expect("file");

        let runtime: Vec<_> = config
            .layers()
            .iter()
            .filter(|layer| layer.source == ConfigLayerSource::Runtime)
            .collect();
        assert_eq!(runtime.len(), 1);
        assert_eq!(
            runtime[0].path.as_deref(),
            Some(Path::new("/etc/app/two.json5"))
        );
        assert_eq!(config.layers().len(), 6);
        assert_eq!(config.get("one").expect("get"), Some(Value::from(1)));
    }

    #[test]
    fn relative_file_path_is_always_rejected() {
        let mut config = memory_config(MemorySource::new(), MapEnv::new());
        let options = LoadOptions::default()
            .with_ignore_errors(true)
            .with_ignore_not_found(true);
        let err = config
            .file("config/extra.json5", options)
            .expect_err("relative");
        assert!(matches!(err, ConfigError::InvalidPath(_)));
    }

    /// Verify that both contents and absence are cached per key.
    #[test]
    fn read_caches_contents_and_absence() {
        let files = MemorySource::new().with_bytes("/etc/app/key.pem", b"KEY".to_vec());
        let mut config = memory_config(files.clone(), MapEnv::new());
        config.set("tls.key", "/etc/app/key.pem").expect("set");
        config.set("tls.cert", "/etc/app/missing.pem").expect("set");

        assert_eq!(
            config.read("tls.key").expect("read").as_deref(),
            Some(&b"KEY"[..])
        );
        assert_eq!(config.read("tls.cert").expect("read"), None);
        assert_eq!(config.read("tls.none").expect("read"), None);

        files.remove("/etc/app/key.pem");
        files.insert_bytes("/etc/app/missing.pem", b"CERT".to_vec());
        assert_eq!(
            config.read("tls.key").expect("read").as_deref(),
            Some(&b"KEY"[..])
        );
        assert_eq!(config.read("tls.cert").expect("read"), None);
    }

    /// Verify typed decoding of resolved values.
    #[test]
    fn get_as_decodes_resolved_values() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Redis {
            host: String,
            port: u16,
        }

        let mut config = memory_config(MemorySource::new(), MapEnv::new());
        config
            .merge(mapping(json!({"redis": {"host": "localhost", "port": 6379}})))
            .expect("merge");

        assert_eq!(
            config.get_as::<Redis>("redis").expect("decode"),
            Some(Redis {
                host: "localhost".to_string(),
                port: 6379
            })
        );
        assert!(matches!(
            config.get_as::<u16>("redis.host"),
            Err(ConfigError::DecodeFailed { .. })
        ));
        assert_eq!(config.get_as::<u16>("redis.missing").expect("decode"), None);
    }

    /// Verify that a snapshot is unaffected by later writes.
    #[test]
    fn snapshot_survives_later_writes() {
        let mut config = memory_config(MemorySource::new(), MapEnv::new());
        config.set("name", "before").expect("set");

        let snapshot = config.snapshot().expect("snapshot");
        config.set("name", "after").expect("set");
        assert_eq!(snapshot.get("name"), Some(&Value::from("before")));
        assert_eq!(config.get("name").expect("get"), Some(Value::from("after")));
    }

    #[test]
    fn reset_allows_a_fresh_bootstrap() {
        let files =
            MemorySource::new().with_file(format!("{ROOT}/config.json5"), json!({"name": "base"}));
        let mut config = memory_config(files.clone(), MapEnv::new());
        config.set("extra", 1).expect("set");

        config.reset();
        assert!(!config.is_loaded());
        files.insert_file(format!("{ROOT}/config.json5"), json!({"name": "reloaded"}));
        assert_eq!(
            config.tree().expect("tree").to_json(),
            json!({"name": "reloaded"})
        );
    }
}
