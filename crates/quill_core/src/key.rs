//! Cache keys identifying normalized objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The key of the root query object in the normalized cache.
pub const QUERY_ROOT: &str = "QUERY_ROOT";

/// The key of the root mutation object in the normalized cache.
pub const MUTATION_ROOT: &str = "MUTATION_ROOT";

/// An opaque string uniquely identifying a normalized object.
///
/// Keys are either identity-based (`"Hero:42"`) or path-based
/// (`"QUERY_ROOT.allAnimals.0"`). Equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key under which the query root object is stored.
    pub fn query_root() -> Self {
        Self(QUERY_ROOT.to_string())
    }

    /// The key under which the mutation root object is stored.
    pub fn mutation_root() -> Self {
        Self(MUTATION_ROOT.to_string())
    }

    /// Derives the path-based key of a child field of this object.
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
