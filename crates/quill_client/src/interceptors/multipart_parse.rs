//! Multipart stream fan-out.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::multipart::{boundary_parameter, is_known_multipart, parse_multipart_body, MultipartEvent};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use bytes::Bytes;
use quill_core::Operation;
use std::sync::Arc;
use tracing::debug;

/// Splits a `multipart/mixed` response into payload chunks and forwards each
/// chunk down the remaining pipeline, so downstream interceptors deliver one
/// result per part.
pub struct MultipartResponseParsingInterceptor;

#[async_trait]
impl<Op: Operation> Interceptor<Op> for MultipartResponseParsingInterceptor {
    fn id(&self) -> &str {
        "quill.multipart-parse"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        let Some(response) = response else {
            chain.proceed(request, None, self).await;
            return;
        };

        let Some(content_type) = response.content_type().map(str::to_string) else {
            chain.proceed(request, Some(response), self).await;
            return;
        };
        if !is_known_multipart(&content_type) {
            chain.proceed(request, Some(response), self).await;
            return;
        }
        let Some(boundary) = boundary_parameter(&content_type) else {
            chain
                .handle_error(
                    ClientError::Parse("multipart response without a boundary".to_string()),
                    request,
                    Some(response),
                )
                .await;
            return;
        };

        let chunks = match parse_multipart_body(&response.body, &boundary) {
            Ok(events) => events
                .into_iter()
                .filter_map(|event| match event {
                    MultipartEvent::Chunk(chunk) => Some(chunk),
                    MultipartEvent::End => None,
                })
                .collect::<Vec<_>>(),
            Err(error) => {
                chain.handle_error(error, request, Some(response)).await;
                return;
            }
        };

        if chunks.is_empty() {
            chain
                .handle_error(ClientError::NoParsedResponse, request, Some(response))
                .await;
            return;
        }

        debug!(operation = Op::NAME, parts = chunks.len(), "multipart stream parsed");
        let last = chunks.len() - 1;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let body = match serde_json::to_vec(&chunk) {
                Ok(body) => body,
                Err(error) => {
                    chain
                        .handle_error(ClientError::Parse(error.to_string()), request, Some(response))
                        .await;
                    return;
                }
            };
            let mut part = response.clone();
            part.body = Bytes::from(body);
            part.is_final_part = index == last;
            // Parts fan out in receive order; each proceeds through the
            // rest of the pipeline before the next starts.
            chain.proceed(request.clone(), Some(part), self).await;
        }
    }
}
