//! Response payload normalization.

use crate::key_resolver::CacheKeyResolver;
use quill_core::{CacheKey, Record, RecordSet, RecordValue, SelectionSet};
use serde_json::Value;

/// Normalizes a denormalized response payload into records.
///
/// Walks `selection_set` over `payload`, assigning each composite object a
/// cache key through `resolver` (identity keys win; objects without identity
/// get path-based keys under their parent). Fields absent from the payload
/// are skipped so partial data normalizes without damage.
pub fn normalize_response(
    payload: &serde_json::Map<String, Value>,
    root_key: &CacheKey,
    selection_set: &SelectionSet,
    resolver: &dyn CacheKeyResolver,
) -> RecordSet {
    let mut records = RecordSet::new();
    normalize_object(payload, root_key, selection_set, resolver, &mut records);
    records
}

fn normalize_object(
    object: &serde_json::Map<String, Value>,
    key: &CacheKey,
    selection_set: &SelectionSet,
    resolver: &dyn CacheKeyResolver,
    records: &mut RecordSet,
) {
    let type_name = object.get("__typename").and_then(Value::as_str);
    let mut record = Record::new(key.clone());

    for field in selection_set.fields_for_type(type_name) {
        let Some(value) = object.get(field.response_key()) else {
            continue;
        };
        let storage_key = field.storage_key();
        let stored = if field.selections.is_empty() {
            RecordValue::Scalar(value.clone())
        } else {
            normalize_value(value, key, &storage_key, &field.selections, resolver, records)
        };
        record.set(storage_key, stored);
    }

    records.insert(record);
}

fn normalize_value(
    value: &Value,
    parent_key: &CacheKey,
    storage_key: &str,
    selections: &[quill_core::Selection],
    resolver: &dyn CacheKeyResolver,
    records: &mut RecordSet,
) -> RecordValue {
    match value {
        Value::Object(object) => {
            let child_key = resolver
                .cache_key(object)
                .unwrap_or_else(|| parent_key.child(storage_key));
            let set = SelectionSet::new(selections.to_vec());
            normalize_object(object, &child_key, &set, resolver, records);
            RecordValue::reference(child_key)
        }
        Value::Array(items) => {
            let markers = items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(object) => {
                        let child_key = resolver.cache_key(object).unwrap_or_else(|| {
                            parent_key.child(storage_key).child(&index.to_string())
                        });
                        let set = SelectionSet::new(selections.to_vec());
                        normalize_object(object, &child_key, &set, resolver, records);
                        serde_json::json!({"$reference": child_key.as_str()})
                    }
                    other => other.clone(),
                })
                .collect();
            RecordValue::Scalar(Value::Array(markers))
        }
        other => RecordValue::Scalar(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute_selection_set;
    use crate::key_resolver::IdCacheKeyResolver;
    use quill_core::{Field, Selection};
    use serde_json::json;

    fn hero_selection() -> SelectionSet {
        SelectionSet::default().field(Field::composite(
            "hero",
            vec![
                Selection::Field(Field::leaf("__typename")),
                Selection::Field(Field::leaf("id")),
                Selection::Field(Field::leaf("name")),
            ],
        ))
    }

    #[test]
    fn test_identity_objects_get_type_id_keys() {
        let payload = json!({
            "hero": {"__typename": "Droid", "id": "2001", "name": "R2-D2"}
        });
        let records = normalize_response(
            payload.as_object().unwrap(),
            &CacheKey::query_root(),
            &hero_selection(),
            &IdCacheKeyResolver,
        );

        let root = records.get(&CacheKey::query_root()).unwrap();
        assert_eq!(
            root.get("hero").unwrap().as_reference().unwrap().as_str(),
            "Droid:2001"
        );
        let hero = records.get(&CacheKey::from("Droid:2001")).unwrap();
        assert_eq!(hero.get("name"), Some(&RecordValue::scalar("R2-D2")));
    }

    #[test]
    fn test_objects_without_identity_get_path_keys() {
        let payload = json!({"hero": {"name": "R2-D2"}});
        let set = SelectionSet::default().field(Field::composite(
            "hero",
            vec![Selection::Field(Field::leaf("name"))],
        ));
        let records = normalize_response(
            payload.as_object().unwrap(),
            &CacheKey::query_root(),
            &set,
            &IdCacheKeyResolver,
        );

        assert!(records.get(&CacheKey::from("QUERY_ROOT.hero")).is_some());
    }

    #[test]
    fn test_lists_normalize_per_element() {
        let payload = json!({
            "friends": [
                {"__typename": "Human", "id": "1000", "name": "Luke"},
                {"__typename": "Human", "id": "1003", "name": "Leia"},
            ]
        });
        let set = SelectionSet::default().field(Field::composite(
            "friends",
            vec![
                Selection::Field(Field::leaf("__typename")),
                Selection::Field(Field::leaf("id")),
                Selection::Field(Field::leaf("name")),
            ],
        ));
        let records = normalize_response(
            payload.as_object().unwrap(),
            &CacheKey::query_root(),
            &set,
            &IdCacheKeyResolver,
        );

        assert!(records.get(&CacheKey::from("Human:1000")).is_some());
        assert!(records.get(&CacheKey::from("Human:1003")).is_some());
    }

    #[test]
    fn test_normalize_then_execute_round_trips() {
        let payload = json!({
            "hero": {"__typename": "Droid", "id": "2001", "name": "R2-D2"}
        });
        let records = normalize_response(
            payload.as_object().unwrap(),
            &CacheKey::query_root(),
            &hero_selection(),
            &IdCacheKeyResolver,
        );

        let executed =
            execute_selection_set(&records, &CacheKey::query_root(), &hero_selection()).unwrap();
        assert_eq!(executed.data.into_value()["hero"]["name"], "R2-D2");
    }
}
