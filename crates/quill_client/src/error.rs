//! Client error surface.

use quill_core::GraphQLError;
use quill_store::StoreError;
use thiserror::Error;

/// The closed set of errors a request chain can surface to its caller.
///
/// Cancellation is deliberately absent: a cancelled chain suppresses its
/// completion instead of delivering an error.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("the request chain was built with no interceptors")]
    NoInterceptors,

    /// A cache-only fetch policy could not be satisfied; carries the dotted
    /// response path of the first missing field.
    #[error("cache miss at {0}")]
    CacheMiss(String),

    #[error("received invalid response code {status}: {body}")]
    InvalidResponseCode { status: u16, body: String },

    /// The chain reached its end without any interceptor producing a parsed
    /// result.
    #[error("no parsed response at the end of the request chain")]
    NoParsedResponse,

    /// Internal signal that the server wants the full document after an
    /// automatic-persisted-query miss; consumed by the APQ interceptor.
    #[error("persisted query not found on the server")]
    PersistedQueryNotFound,

    #[error("request retried more than {0} times")]
    TooManyRetries(u32),

    /// A response carried errors and an interceptor elevated them to a
    /// failure. Errors alongside data are normally delivered as a success.
    #[error("response carried {} GraphQL error(s)", .0.len())]
    GraphqlErrors(Vec<GraphQLError>),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("failed to build upload body: {0}")]
    Upload(String),
}

impl From<StoreError> for ClientError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::CacheMiss(path) => Self::CacheMiss(path),
            StoreError::InvalidData(message) => Self::Parse(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_cache_miss_maps_to_client_cache_miss() {
        let error: ClientError = StoreError::CacheMiss("hero.name".to_string()).into();
        assert!(matches!(error, ClientError::CacheMiss(path) if path == "hero.name"));
    }

    #[test]
    fn test_display_messages() {
        let error = ClientError::InvalidResponseCode {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "received invalid response code 500: boom");
    }
}
