//! Merge helpers for layered configuration.

use crate::value::{Mapping, Value};

/// Merge `source` into `target`, recursing only where both sides hold a
/// mapping.
///
/// Everything else, sequences and computed properties included, is copied
/// over verbatim and replaces the previous value. Computed properties are
/// moved as evaluators, so they keep reading their (merged) siblings.
pub fn deep_merge(target: &mut Mapping, source: &Mapping) {
    for (key, value) in source {
        if let Value::Mapping(incoming) = value {
            if let Some(Value::Mapping(existing)) = target.get_mut(key) {
                deep_merge(existing, incoming);
                continue;
            }
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Copy every top-level entry of `source` into `target`, replacing existing
/// values without merging.
pub fn assign(target: &mut Mapping, source: &Mapping) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
