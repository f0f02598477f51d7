//! The URL session abstraction the network interceptor talks to.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// A raw HTTP exchange, before any GraphQL interpretation.
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Bytes,
}

/// Issues HTTP requests on behalf of the network interceptor.
///
/// The default implementation is [`HyperSession`]; tests substitute
/// [`crate::testing::MockSession`] to script exchanges without a server.
#[async_trait]
pub trait HttpSession: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Bytes,
    ) -> Result<SessionResponse, SessionError>;
}

/// The hyper-backed session used in production.
pub struct HyperSession {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Default for HyperSession {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperSession {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

#[async_trait]
impl HttpSession for HyperSession {
    async fn post(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Bytes,
    ) -> Result<SessionResponse, SessionError> {
        let uri: hyper::Uri = url
            .parse()
            .map_err(|_| SessionError::InvalidUrl(url.to_string()))?;

        let mut builder = hyper::Request::builder().method(hyper::Method::POST).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        debug!(%url, "dispatching GraphQL HTTP request");
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut response_headers = IndexMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.to_string(), value.to_string());
            }
        }
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?
            .to_bytes();

        Ok(SessionResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
