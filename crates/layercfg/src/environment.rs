//! Named-environment classification.
//!
//! Every answer is derived from the environment source at call time; nothing
//! is cached, so changing `APP_ENV` mid-process changes the answers at once.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Variable holding the active environment name.
pub const ENV_NAME_VAR: &str = "APP_ENV";
/// Variable flagging a CI run.
pub const CI_VAR: &str = "CI";
/// Environment used when `APP_ENV` is unset or empty.
pub const DEFAULT_ENVIRONMENT: &str = "development";

const PRODUCTION: &str = "production";
const STAGING: &str = "staging";
const TEST: &str = "test";

/// Capability to read environment variables.
pub trait EnvSource: Send {
    /// Value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
    /// Every variable currently set.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        // Non-unicode entries cannot name a config path; skip them.
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

/// In-memory environment. Clones share the same variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.lock().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) {
        self.vars.lock().remove(name);
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.lock().get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .lock()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Classifies the active environment from an [`EnvSource`].
pub struct Environment {
    source: Box<dyn EnvSource>,
}

impl Environment {
    pub fn new(source: impl EnvSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub(crate) fn from_boxed(source: Box<dyn EnvSource>) -> Self {
        Self { source }
    }

    /// Active environment name, `development` when unset or empty.
    pub fn name(&self) -> String {
        self.source
            .var(ENV_NAME_VAR)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    /// Alias of [`Environment::name`].
    pub fn get_env(&self) -> String {
        self.name()
    }

    pub fn is_production(&self) -> bool {
        self.name() == PRODUCTION
    }

    /// Alias of [`Environment::is_production`].
    pub fn is_prod(&self) -> bool {
        self.is_production()
    }

    pub fn is_staging(&self) -> bool {
        self.name() == STAGING
    }

    /// Production or staging.
    pub fn is_production_like(&self) -> bool {
        let name = self.name();
        name == PRODUCTION || name == STAGING
    }

    /// Alias of [`Environment::is_production_like`].
    pub fn is_prod_like(&self) -> bool {
        self.is_production_like()
    }

    pub fn is_test(&self) -> bool {
        self.name() == TEST
    }

    /// Any environment other than production or staging.
    pub fn is_dev(&self) -> bool {
        !self.is_production_like()
    }

    /// Alias of [`Environment::is_dev`].
    pub fn is_development(&self) -> bool {
        self.is_dev()
    }

    /// True when `CI` is set to a non-empty value.
    pub fn is_ci(&self) -> bool {
        self.source.var(CI_VAR).is_some_and(|value| !value.is_empty())
    }

    /// Snapshot of every variable in the source.
    pub fn vars(&self) -> Vec<(String, String)> {
        self.source.vars()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(ProcessEnv)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
