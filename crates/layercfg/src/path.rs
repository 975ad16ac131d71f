//! Dotted-path access (`"a.b.c"`) over a configuration tree.

use crate::value::{Mapping, Value};
use std::borrow::Cow;

/// Separator between path segments.
const PATH_SEPARATOR: char = '.';

/// Read the value at `path`, evaluating computed properties along the way.
///
/// Returns `None` as soon as a segment is missing or the value reached is not
/// a mapping.
pub fn get_path(tree: &Mapping, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let (first, rest) = segments.split_first()?;
    walk(tree, first, rest)
}

fn walk(parent: &Mapping, key: &str, rest: &[&str]) -> Option<Value> {
    let value = child(parent, key)?;
    match rest.split_first() {
        None => Some(value.into_owned()),
        Some((next, rest)) => match value.as_ref() {
            Value::Mapping(map) => walk(map, next, rest),
            _ => None,
        },
    }
}

fn child<'a>(parent: &'a Mapping, key: &str) -> Option<Cow<'a, Value>> {
    match parent.get(key)? {
        Value::Computed(computed) => Some(Cow::Owned(computed.evaluate(parent))),
        value => Some(Cow::Borrowed(value)),
    }
}

/// Assign `value` at `path`, creating intermediate mappings as needed, and
/// return whatever was readable there before.
///
/// An intermediate segment that holds anything other than a mapping is
/// replaced by an empty mapping.
pub fn set_path(tree: &mut Mapping, path: &str, value: Value) -> Option<Value> {
    let previous = get_path(tree, path);
    insert_path(tree, path, value);
    previous
}

/// [`set_path`] without reading the previous value, so no computed property
/// is evaluated.
pub(crate) fn insert_path(tree: &mut Mapping, path: &str, value: Value) {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(*segment)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        current = ensure_mapping(slot);
    }
    current.insert(*last, value);
}

/// Remove the value stored at `path`, returning it unevaluated.
pub fn remove_path(tree: &mut Mapping, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let (last, parents) = segments.split_last()?;

    let mut current = tree;
    for segment in parents {
        match current.get_mut(segment)? {
            Value::Mapping(map) => current = map,
            _ => return None,
        }
    }
    current.remove(last)
}

fn ensure_mapping(slot: &mut Value) -> &mut Mapping {
    if !matches!(slot, Value::Mapping(_)) {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(map) => map,
        _ => unreachable!("slot was just replaced with a mapping"),
    }
}
