//! `CFG__` environment variable overrides.
//!
//! `CFG__REDIS__MAX_RETRIES=5` sets `redis.maxRetries` to the string `"5"`.
//! Segments are separated by `__`; inside a segment a single `_` marks a
//! camel-case boundary. Values are never coerced.

use crate::path::insert_path;
use crate::value::{Mapping, Value};
use log::{debug, warn};

/// Prefix selecting the variables that override config.
pub const ENV_PREFIX: &str = "CFG__";
/// Separator between path segments in a variable name.
pub const ENV_PATH_SEPARATOR: &str = "__";

/// Decode a variable name into a dotted config path.
///
/// Returns `None` when the name lacks the prefix or any segment decodes to
/// nothing.
pub fn decode_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    let segments = rest
        .split(ENV_PATH_SEPARATOR)
        .map(camel_case)
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("."))
}

fn camel_case(segment: &str) -> Option<String> {
    let mut words = segment.split('_').filter(|word| !word.is_empty());
    let mut out = words.next()?.to_lowercase();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    Some(out)
}

/// Apply every `CFG__` variable in `vars` to `tree`, returning how many were
/// applied.
///
/// Variables are applied in lexicographic order of their names, so when two
/// decode to the same path the later name wins.
pub fn ingest(tree: &mut Mapping, vars: impl IntoIterator<Item = (String, String)>) -> usize {
    let mut matching: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with(ENV_PREFIX))
        .collect();
    matching.sort_by(|a, b| a.0.cmp(&b.0));

    let mut applied = 0;
    for (name, value) in matching {
        let Some(path) = decode_key(&name) else {
            warn!("ignoring undecodable config variable (name={name})");
            continue;
        };
        debug!("applying config variable (name={name}, path={path})");
        insert_path(tree, &path, Value::String(value));
        applied += 1;
    }
    applied
}
