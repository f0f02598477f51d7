//! Normalized records and record sets.

use crate::key::CacheKey;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single field value inside a normalized record.
///
/// A `Reference` points at another record by cache key; every other JSON
/// value is stored verbatim as a `Scalar`. Lists of references are scalars
/// whose elements serialize as reference markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Reference(ReferenceMarker),
    Scalar(serde_json::Value),
}

/// Serde shape of a reference: `{"$reference": "<cache key>"}`.
///
/// Keeping the marker explicit lets record sets round-trip through JSON
/// fixtures without a side table of which fields are references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    #[serde(rename = "$reference")]
    pub key: CacheKey,
}

impl RecordValue {
    pub fn reference(key: impl Into<CacheKey>) -> Self {
        Self::Reference(ReferenceMarker { key: key.into() })
    }

    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Self::Scalar(value.into())
    }

    /// Returns the referenced cache key, if this value is a reference.
    pub fn as_reference(&self) -> Option<&CacheKey> {
        match self {
            Self::Reference(marker) => Some(&marker.key),
            Self::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Reference(_) => None,
        }
    }
}

/// A normalized object: a cache key plus a map from field key to value.
///
/// Field iteration order is kept stable so that serialized records diff
/// deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: CacheKey,
    pub fields: IndexMap<String, RecordValue>,
}

impl Record {
    pub fn new(key: impl Into<CacheKey>) -> Self {
        Self {
            key: key.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: RecordValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: RecordValue) {
        self.fields.insert(field.into(), value);
    }

    /// Merges `other` into this record field-by-field, last write wins.
    ///
    /// Returns the field keys whose value actually changed.
    pub fn merge(&mut self, other: Record) -> HashSet<String> {
        let mut changed = HashSet::new();
        for (field, value) in other.fields {
            match self.fields.get(&field) {
                Some(existing) if *existing == value => {}
                _ => {
                    self.fields.insert(field.clone(), value);
                    changed.insert(field);
                }
            }
        }
        changed
    }
}

/// A set of normalized records keyed by cache key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    records: FxHashMap<CacheKey, Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.key.clone(), record);
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<Record> {
        self.records.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Record)> {
        self.records.iter()
    }

    pub fn into_records(self) -> impl Iterator<Item = Record> {
        self.records.into_values()
    }

    /// Merges every record of `other` into this set, field-by-field.
    ///
    /// Returns the cache keys whose serialized content changed. A key that
    /// was absent before counts as changed; a merge that rewrites a field
    /// with an identical value does not.
    pub fn merge(&mut self, other: RecordSet) -> HashSet<CacheKey> {
        let mut changed = HashSet::new();
        for (key, record) in other.records {
            match self.records.get_mut(&key) {
                Some(existing) => {
                    if !existing.merge(record).is_empty() {
                        changed.insert(key);
                    }
                }
                None => {
                    self.records.insert(key.clone(), record);
                    changed.insert(key);
                }
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
