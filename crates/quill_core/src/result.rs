//! GraphQL results and errors as delivered to callers.

use crate::key::CacheKey;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
    Server,
}

/// A GraphQL error as carried in the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            locations: Vec::new(),
            extensions: None,
        }
    }

    /// True if the server flagged this error as a missing persisted query.
    pub fn is_persisted_query_not_found(&self) -> bool {
        self.message == "PersistedQueryNotFound"
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A source position attached to a GraphQL error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// The wire envelope of a single GraphQL response payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl ResponseEnvelope {
    /// True if the server asked for the full document after an APQ miss.
    pub fn requests_full_document(&self) -> bool {
        self.errors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(GraphQLError::is_persisted_query_not_found)
    }
}

/// The result of executing a GraphQL operation.
///
/// Errors alongside partial data are a success: callers inspect
/// [`GraphQLResult::errors`] themselves. `dependent_keys` is populated for
/// results read from (or written through) the normalized cache and drives
/// query watching.
#[derive(Debug, Clone)]
pub struct GraphQLResult<D> {
    pub data: Option<D>,
    pub errors: Vec<GraphQLError>,
    pub extensions: Option<HashMap<String, serde_json::Value>>,
    pub source: ResultSource,
    pub dependent_keys: Option<HashSet<CacheKey>>,
}

impl<D> GraphQLResult<D> {
    pub fn from_server(data: Option<D>, errors: Vec<GraphQLError>) -> Self {
        Self {
            data,
            errors,
            extensions: None,
            source: ResultSource::Server,
            dependent_keys: None,
        }
    }

    pub fn from_cache(data: D, dependent_keys: HashSet<CacheKey>) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            extensions: None,
            source: ResultSource::Cache,
            dependent_keys: Some(dependent_keys),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn map_data<U>(self, f: impl FnOnce(D) -> U) -> GraphQLResult<U> {
        GraphQLResult {
            data: self.data.map(f),
            errors: self.errors,
            extensions: self.extensions,
            source: self.source,
            dependent_keys: self.dependent_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_parses_errors_without_data() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "errors": [{"message": "Bad request, could not start execution!"}]
        }))
        .unwrap();

        assert!(envelope.data.is_none());
        let errors = envelope.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Bad request, could not start execution!");
    }

    #[test]
    fn test_apq_miss_detection() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "errors": [{"message": "PersistedQueryNotFound"}]
        }))
        .unwrap();
        assert!(envelope.requests_full_document());

        let other: ResponseEnvelope =
            serde_json::from_value(json!({"data": {"hero": null}})).unwrap();
        assert!(!other.requests_full_document());
    }

    #[test]
    fn test_errors_with_data_are_a_success_result() {
        let result = GraphQLResult::from_server(
            Some(json!({"hero": {"name": "R2-D2"}})),
            vec![GraphQLError::new("fields partially resolved")],
        );
        assert!(result.has_errors());
        assert!(result.data.is_some());
        assert_eq!(result.source, ResultSource::Server);
    }
}
