//! Cache key assignment policy for normalization.

use quill_core::CacheKey;
use serde_json::Value;

/// Decides the cache key of an object encountered while normalizing a
/// response payload. Returning `None` falls back to a path-based key derived
/// from the object's position in the response.
pub trait CacheKeyResolver: Send + Sync {
    fn cache_key(&self, object: &serde_json::Map<String, Value>) -> Option<CacheKey>;
}

/// The default policy: `<__typename>:<id>` when both fields are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdCacheKeyResolver;

impl CacheKeyResolver for IdCacheKeyResolver {
    fn cache_key(&self, object: &serde_json::Map<String, Value>) -> Option<CacheKey> {
        let type_name = object.get("__typename")?.as_str()?;
        let id = match object.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(CacheKey::new(format!("{type_name}:{id}")))
    }
}

/// Never assigns identity keys; every object gets a path-based key. Useful
/// for schemas without stable identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOnlyCacheKeyResolver;

impl CacheKeyResolver for PathOnlyCacheKeyResolver {
    fn cache_key(&self, _object: &serde_json::Map<String, Value>) -> Option<CacheKey> {
        None
    }
}
