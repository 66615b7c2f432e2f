//! Schema merging and tagged-value aggregation.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Copies fields, tagged values and optionally bases from `source` into
/// `dest`.
///
/// Without `overwrite`, fields and tagged values already present on `dest`
/// are kept, except fields `dest` only inherits, which are always replaced
/// by an own copy. With `overwrite`, own fields of `dest` missing from
/// `source` are deleted and everything from `source` wins.
///
/// Copied fields keep their markers and creation order and are rebound to
/// `dest`. With `sync_bases`, `dest` takes the bases of `source`; without
/// `overwrite` its own extra bases are appended after them.
pub fn sync_schema(source: &Schema, dest: &mut Schema, overwrite: bool, sync_bases: bool) {
    if overwrite {
        let stale: Vec<String> = dest
            .fields()
            .keys()
            .filter(|name| source.get(name).is_none())
            .cloned()
            .collect();
        for name in stale {
            dest.remove_field(&name);
        }
    }

    let mut copied = 0usize;
    for field in source.fields_in_order() {
        let name = field.name();
        if overwrite || !dest.contains(name) {
            dest.insert_field(field.clone());
            copied += 1;
        }
    }

    for (tag, value) in source.tagged_values() {
        if overwrite || dest.tagged_value(tag).is_none() {
            dest.set_tagged_value(tag.clone(), value.clone());
        }
    }

    if overwrite || dest.fieldsets().is_empty() {
        dest.set_fieldsets(source.fieldsets().to_vec());
    }
    if overwrite || dest.invariants().is_empty() {
        dest.set_invariants(source.invariants().to_vec());
    }

    if sync_bases {
        let mut bases: Vec<Arc<Schema>> = source.bases().to_vec();
        if !overwrite {
            for base in dest.bases() {
                if !bases.iter().any(|b| b.same_as(base)) {
                    bases.push(Arc::clone(base));
                }
            }
        }
        dest.set_bases(bases);
    }

    debug!(
        "synced {} fields from {} into {}",
        copied,
        source.identifier(),
        dest.identifier()
    );
}

/// Concatenates the list tagged value `key` across the resolution order,
/// least specific schema first.
///
/// # Errors
/// Returns [`Error::TaggedValueShape`] if a schema holds something other
/// than a list or tuple under `key`.
pub fn merged_tagged_value_list(schema: &Schema, key: &str) -> Result<Vec<Value>> {
    let mut merged = Vec::new();
    for iface in schema.resolution_order().into_iter().rev() {
        match iface.tagged_value(key) {
            None => {}
            Some(Value::List(items) | Value::Tuple(items)) => merged.extend(items.iter().cloned()),
            Some(_) => return Err(shape_error(iface, key, "list")),
        }
    }
    Ok(merged)
}

/// Merges the dict tagged value `key` across the resolution order; entries
/// from more specific schemas override less specific ones.
///
/// # Errors
/// Returns [`Error::TaggedValueShape`] if a schema holds something other
/// than a dict under `key`.
pub fn merged_tagged_value_dict(schema: &Schema, key: &str) -> Result<BTreeMap<Value, Value>> {
    let mut merged = BTreeMap::new();
    for iface in schema.resolution_order().into_iter().rev() {
        match iface.tagged_value(key) {
            None => {}
            Some(Value::Dict(items)) => {
                merged.extend(items.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(_) => return Err(shape_error(iface, key, "dict")),
        }
    }
    Ok(merged)
}

fn shape_error(schema: &Schema, key: &str, expected: &'static str) -> Error {
    Error::TaggedValueShape {
        key: key.to_string(),
        schema: schema.identifier(),
        expected,
    }
}
