//! Selection set execution against a record set.

use crate::store::StoreError;
use quill_core::{CacheKey, DataDict, RecordSet, RecordValue, Selection, SelectionSet};
use serde_json::Value;
use std::collections::HashSet;

/// The outcome of executing a selection set: the denormalized data plus every
/// cache key the traversal touched.
#[derive(Debug, Clone)]
pub struct ExecutedSelection {
    pub data: DataDict,
    pub dependent_keys: HashSet<CacheKey>,
}

/// Executes `selection_set` rooted at `root_key` against `records`.
///
/// Fields resolve by storage key (name plus canonicalized arguments);
/// references are followed recursively. Every record visited lands in
/// `dependent_keys`. A field absent from its record, or a reference whose
/// target record is missing, fails with [`StoreError::CacheMiss`] naming the
/// dotted response path.
pub fn execute_selection_set(
    records: &RecordSet,
    root_key: &CacheKey,
    selection_set: &SelectionSet,
) -> Result<ExecutedSelection, StoreError> {
    let mut dependent_keys = HashSet::new();
    let data = execute_object(
        records,
        root_key,
        selection_set,
        &mut Vec::new(),
        &mut dependent_keys,
    )?;
    Ok(ExecutedSelection {
        data,
        dependent_keys,
    })
}

fn execute_object(
    records: &RecordSet,
    key: &CacheKey,
    selection_set: &SelectionSet,
    path: &mut Vec<String>,
    dependent_keys: &mut HashSet<CacheKey>,
) -> Result<DataDict, StoreError> {
    let record = records
        .get(key)
        .ok_or_else(|| StoreError::CacheMiss(join_path(path)))?;
    dependent_keys.insert(key.clone());

    let type_name = record
        .get("__typename")
        .and_then(RecordValue::as_scalar)
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut out = serde_json::Map::new();
    for field in selection_set.fields_for_type(type_name.as_deref()) {
        path.push(field.response_key().to_string());
        let stored = record
            .get(&field.storage_key())
            .ok_or_else(|| StoreError::CacheMiss(join_path(path)))?;
        let resolved = resolve_value(records, stored, &field.selections, path, dependent_keys)?;
        out.insert(field.response_key().to_string(), resolved);
        path.pop();
    }

    let fulfilled = selection_set.fulfilled_fragment_names(type_name.as_deref());
    Ok(DataDict::new(out).with_fulfilled_fragments(fulfilled))
}

fn resolve_value(
    records: &RecordSet,
    value: &RecordValue,
    selections: &[Selection],
    path: &mut Vec<String>,
    dependent_keys: &mut HashSet<CacheKey>,
) -> Result<Value, StoreError> {
    match value {
        RecordValue::Reference(marker) => {
            let set = SelectionSet::new(selections.to_vec());
            let dict = execute_object(records, &marker.key, &set, path, dependent_keys)?;
            Ok(dict.into_value())
        }
        RecordValue::Scalar(scalar) => resolve_scalar(records, scalar, selections, path, dependent_keys),
    }
}

// Scalars can still contain reference markers, e.g. a list of references is
// stored as a JSON array of `{"$reference": ...}` objects.
fn resolve_scalar(
    records: &RecordSet,
    scalar: &Value,
    selections: &[Selection],
    path: &mut Vec<String>,
    dependent_keys: &mut HashSet<CacheKey>,
) -> Result<Value, StoreError> {
    if let Some(key) = reference_key(scalar) {
        let set = SelectionSet::new(selections.to_vec());
        let dict = execute_object(records, &key, &set, path, dependent_keys)?;
        return Ok(dict.into_value());
    }
    match scalar {
        Value::Array(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                resolved.push(resolve_scalar(records, item, selections, path, dependent_keys)?);
                path.pop();
            }
            Ok(Value::Array(resolved))
        }
        other => Ok(other.clone()),
    }
}

fn reference_key(value: &Value) -> Option<CacheKey> {
    value
        .as_object()
        .and_then(|map| map.get("$reference"))
        .and_then(Value::as_str)
        .map(CacheKey::from)
}

fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "<query root>".to_string()
    } else {
        path.join(".")
    }
}
