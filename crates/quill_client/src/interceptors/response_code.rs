//! HTTP status validation.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::Operation;
use std::sync::Arc;

/// Fails any response outside the 2xx range before parsing is attempted.
pub struct ResponseCodeInterceptor;

#[async_trait]
impl<Op: Operation> Interceptor<Op> for ResponseCodeInterceptor {
    fn id(&self) -> &str {
        "quill.response-code"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        match response {
            Some(response) if !response.is_successful() => {
                let error = ClientError::InvalidResponseCode {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                };
                chain.handle_error(error, request, Some(response)).await;
            }
            other => chain.proceed(request, other, self).await,
        }
    }
}
