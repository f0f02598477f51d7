//! GraphQL response envelope decoding.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::{GraphQLResult, Operation, ResponseEnvelope};
use std::sync::Arc;

/// Decodes the response body as a `{data, errors, extensions}` envelope and
/// attaches a server-sourced result.
///
/// The Content-Type is deliberately not validated here; any body that
/// decodes as an envelope passes.
pub struct JsonResponseParsingInterceptor;

#[async_trait]
impl<Op: Operation> Interceptor<Op> for JsonResponseParsingInterceptor {
    fn id(&self) -> &str {
        "quill.json-parse"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        let Some(mut response) = response else {
            chain
                .handle_error(ClientError::NoParsedResponse, request, None)
                .await;
            return;
        };
        if response.parsed.is_some() {
            chain.proceed(request, Some(response), self).await;
            return;
        }

        let envelope: ResponseEnvelope = match serde_json::from_slice(&response.body) {
            Ok(envelope) => envelope,
            Err(error) => {
                chain
                    .handle_error(ClientError::Parse(error.to_string()), request, Some(response))
                    .await;
                return;
            }
        };

        let data = match envelope.data.clone() {
            Some(value) if !value.is_null() => match serde_json::from_value::<Op::Data>(value) {
                Ok(data) => Some(data),
                Err(error) => {
                    chain
                        .handle_error(
                            ClientError::Parse(error.to_string()),
                            request,
                            Some(response),
                        )
                        .await;
                    return;
                }
            },
            _ => None,
        };

        let mut result = GraphQLResult::from_server(
            data,
            envelope.errors.clone().unwrap_or_default(),
        );
        result.extensions = envelope.extensions.clone();
        response.envelope = Some(envelope);
        response.parsed = Some(result);
        chain.proceed(request, Some(response), self).await;
    }
}
