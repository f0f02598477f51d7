//! Type-erased selection set data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// The type-erased nested mapping backing generated selection set accessors.
///
/// A `DataDict` holds the denormalized payload for one selection set plus the
/// set of fulfilled fragment identifiers: opaque tokens naming which fragments
/// are known to have been materialized in this data. Generated accessors read
/// through [`DataDict::get`]; only selection sets declared as local cache
/// mutations write through [`DataDict::set`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDict {
    data: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    fulfilled_fragments: HashSet<String>,
}

impl DataDict {
    pub fn new(data: serde_json::Map<String, Value>) -> Self {
        Self {
            data,
            fulfilled_fragments: HashSet::new(),
        }
    }

    pub fn with_fulfilled_fragments<I>(mut self, fragments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fulfilled_fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a dictionary from any JSON value; non-objects become empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    /// Reads a field and deserializes it into the accessor's type.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        self.data
            .get(field)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Reads a nested selection set field as its own dictionary.
    pub fn get_dict(&self, field: &str) -> Option<DataDict> {
        match self.data.get(field) {
            Some(Value::Object(map)) => Some(DataDict::new(map.clone())),
            _ => None,
        }
    }

    /// Writes a field value. Only reachable from mutable selection sets.
    pub fn set(&mut self, field: impl Into<String>, value: impl Serialize) {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(field.into(), value);
        }
    }

    /// True if the named fragment was materialized in this data.
    pub fn fulfills(&self, fragment: &str) -> bool {
        self.fulfilled_fragments.contains(fragment)
    }

    pub fn fulfilled_fragments(&self) -> &HashSet<String> {
        &self.fulfilled_fragments
    }

    pub fn as_map(&self) -> &serde_json::Map<String, Value> {
        &self.data
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}
