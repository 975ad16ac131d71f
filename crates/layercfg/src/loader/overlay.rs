//! Splitting reserved `$env_<name>` override blocks out of incoming data.

use super::ENV_OVERRIDE_PREFIX;
use crate::value::{Mapping, Value};
use log::warn;
use std::collections::BTreeMap;

/// Incoming mapping with its environment override blocks pulled out of the
/// data, so the reserved keys never land in the tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadDescriptor {
    pub(crate) base: Mapping,
    overrides: BTreeMap<String, Mapping>,
}

impl LoadDescriptor {
    /// Separate top-level `$env_<name>` keys from the rest of `mapping`.
    pub(crate) fn from_mapping(mapping: Mapping) -> Self {
        let mut base = Mapping::new();
        let mut overrides = BTreeMap::new();
        for (key, value) in mapping {
            let Some(env) = key.strip_prefix(ENV_OVERRIDE_PREFIX).map(str::to_string) else {
                base.insert(key, value);
                continue;
            };
            match value {
                Value::Mapping(block) => {
                    overrides.insert(env, block);
                }
                other => {
                    warn!(
                        "ignoring environment override that is not a mapping (key={key}, kind={})",
                        other.kind()
                    );
                }
            }
        }
        Self { base, overrides }
    }

    /// Split into the base data and the override block for `env`, if any.
    pub(crate) fn into_parts(mut self, env: &str) -> (Mapping, Option<Mapping>) {
        let overlay = self.overrides.remove(env);
        (self.base, overlay)
    }
}
