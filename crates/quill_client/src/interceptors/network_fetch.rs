//! Network dispatch through the URL session abstraction.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::request::{accept_header, HttpRequest};
use crate::response::HttpResponse;
use crate::session::HttpSession;
use async_trait::async_trait;
use quill_core::Operation;
use std::sync::Arc;
use tracing::debug;

/// Issues the HTTP request and attaches the raw response body.
pub struct NetworkFetchInterceptor {
    session: Arc<dyn HttpSession>,
}

impl NetworkFetchInterceptor {
    pub fn new(session: Arc<dyn HttpSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl<Op: Operation> Interceptor<Op> for NetworkFetchInterceptor {
    fn id(&self) -> &str {
        "quill.network-fetch"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        _response: Option<HttpResponse<Op>>,
    ) {
        let (content_type, body) = match request.body() {
            Ok(body) => body,
            Err(error) => {
                chain.handle_error(error, request, None).await;
                return;
            }
        };

        let mut headers = request.headers().clone();
        headers.insert("Content-Type".to_string(), content_type);
        headers.insert("X-Quill-Client-Name".to_string(), request.client_name.clone());
        headers.insert(
            "X-Quill-Client-Version".to_string(),
            request.client_version.clone(),
        );
        // The Accept header is owned by this interceptor: callers may
        // override anything else, but the advertised response formats always
        // follow the operation kind.
        headers.insert("Accept".to_string(), accept_header(Op::KIND));

        debug!(operation = Op::NAME, endpoint = %request.endpoint, "fetching from server");
        match self.session.post(&request.endpoint, &headers, body).await {
            Ok(session_response) => {
                let response = HttpResponse::new(
                    session_response.status,
                    session_response.headers,
                    session_response.body,
                );
                chain.proceed(request, Some(response), self).await;
            }
            Err(error) => {
                chain
                    .handle_error(ClientError::Network(error.to_string()), request, None)
                    .await;
            }
        }
    }
}
