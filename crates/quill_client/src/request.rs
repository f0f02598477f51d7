//! Typed HTTP requests for GraphQL operations.

use crate::error::ClientError;
use bytes::Bytes;
use indexmap::IndexMap;
use quill_core::{Operation, OperationKind};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// How an operation interacts with the normalized cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Return data from the cache when the whole selection is present,
    /// otherwise fetch from the server.
    #[default]
    ReturnCacheDataElseFetch,
    /// Serve only from the cache; an incomplete cache is an error.
    ReturnCacheDataDontFetch,
    /// Return cached data when present, and always fetch a fresh copy too.
    ReturnCacheDataAndFetch,
    /// Skip the cache read but still write the response back to the cache.
    FetchIgnoringCacheData,
    /// Bypass the cache entirely in both directions.
    FetchIgnoringCacheCompletely,
}

impl CachePolicy {
    pub fn consults_cache(&self) -> bool {
        matches!(
            self,
            Self::ReturnCacheDataElseFetch
                | Self::ReturnCacheDataDontFetch
                | Self::ReturnCacheDataAndFetch
        )
    }

    pub fn writes_to_cache(&self) -> bool {
        !matches!(self, Self::FetchIgnoringCacheCompletely)
    }
}

/// Progress of the automatic-persisted-query protocol for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApqPhase {
    /// APQ disabled; always send the full document.
    #[default]
    NotUsed,
    /// First attempt: send the document hash only.
    HashOnly,
    /// The server did not recognize the hash; resend with the document.
    FullDocument,
}

/// An uploaded file attached to a mutation.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub field_name: String,
    pub original_name: String,
    pub path: std::path::PathBuf,
}

/// A typed request describing one operation execution.
#[derive(Debug, Clone)]
pub struct HttpRequest<Op: Operation> {
    pub endpoint: String,
    pub operation: Op,
    pub cache_policy: CachePolicy,
    pub client_name: String,
    pub client_version: String,
    /// Correlates the cache write of this request with store notifications,
    /// so a query watcher can ignore writes it initiated itself.
    pub context_identifier: Option<Uuid>,
    pub apq_phase: ApqPhase,
    headers: IndexMap<String, String>,
    body_override: Option<(String, Bytes)>,
}

impl<Op: Operation> HttpRequest<Op> {
    pub fn new(endpoint: impl Into<String>, operation: Op) -> Self {
        Self {
            endpoint: endpoint.into(),
            operation,
            cache_policy: CachePolicy::default(),
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            context_identifier: None,
            apq_phase: ApqPhase::default(),
            headers: IndexMap::new(),
            body_override: None,
        }
    }

    /// Adds a caller-supplied header. Callers may override every header
    /// except `Accept`, which the network interceptor always sets from the
    /// operation kind.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name.eq_ignore_ascii_case("accept") {
            return;
        }
        self.headers.insert(name, value.into());
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Replaces the JSON operation body, e.g. with a multipart form for
    /// uploads. The string is the body's Content-Type.
    pub fn override_body(&mut self, content_type: impl Into<String>, body: Bytes) {
        self.body_override = Some((content_type.into(), body));
    }

    /// Produces the request body and its Content-Type.
    ///
    /// In the `HashOnly` APQ phase the document itself is withheld and only
    /// the persisted-query extension is sent.
    pub fn body(&self) -> Result<(String, Bytes), ClientError> {
        if let Some((content_type, body)) = &self.body_override {
            return Ok((content_type.clone(), body.clone()));
        }

        let mut body = serde_json::Map::new();
        body.insert("operationName".to_string(), json!(Op::NAME));
        if self.apq_phase != ApqPhase::HashOnly {
            body.insert("query".to_string(), json!(Op::DOCUMENT));
        }
        if let Some(variables) = self.operation.variables() {
            let value =
                serde_json::to_value(variables).map_err(|e| ClientError::Parse(e.to_string()))?;
            body.insert("variables".to_string(), value);
        }
        if self.apq_phase != ApqPhase::NotUsed {
            body.insert(
                "extensions".to_string(),
                json!({
                    "persistedQuery": {
                        "version": 1,
                        "sha256Hash": operation_hash::<Op>(),
                    }
                }),
            );
        }

        let bytes = serde_json::to_vec(&Value::Object(body))
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(("application/json".to_string(), Bytes::from(bytes)))
    }
}

/// The hex SHA-256 digest of the operation document, as registered with the
/// server by the persisted-query protocol.
pub fn operation_hash<Op: Operation>() -> String {
    let digest = Sha256::digest(Op::DOCUMENT.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

const SUBSCRIPTION_SPEC: &str = "boundary=\"graphql\";subscriptionSpec=1.0";
const DEFER_SPEC: &str = "boundary=\"graphql\";deferSpec=20220824";

/// The Accept header value the network interceptor sends for an operation
/// kind. Ordering is deterministic; multipart comes first so streaming
/// servers prefer it.
pub fn accept_header(kind: OperationKind) -> String {
    let spec = if kind.accepts_multipart() {
        SUBSCRIPTION_SPEC
    } else {
        DEFER_SPEC
    };
    format!("multipart/mixed;{spec},application/graphql-response+json,application/json")
}
