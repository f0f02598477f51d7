//! Automatic persisted queries.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::request::{ApqPhase, HttpRequest};
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::Operation;
use std::sync::Arc;
use tracing::debug;

/// Drives the hash-first persisted-query protocol.
///
/// The first attempt sends only the document hash; when the server answers
/// `PersistedQueryNotFound`, the request is restarted with the full document
/// attached.
pub struct AutomaticPersistedQueryInterceptor;

#[async_trait]
impl<Op: Operation> Interceptor<Op> for AutomaticPersistedQueryInterceptor {
    fn id(&self) -> &str {
        "quill.apq"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        mut request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        if request.apq_phase == ApqPhase::NotUsed {
            chain.proceed(request, response, self).await;
            return;
        }

        let Some(response) = response else {
            chain
                .handle_error(ClientError::NoParsedResponse, request, None)
                .await;
            return;
        };
        let Some(envelope) = response.envelope.as_ref() else {
            chain
                .handle_error(ClientError::NoParsedResponse, request, Some(response))
                .await;
            return;
        };

        if request.apq_phase == ApqPhase::HashOnly && envelope.requests_full_document() {
            debug!(operation = Op::NAME, "persisted query unknown; resending full document");
            request.apq_phase = ApqPhase::FullDocument;
            chain.retry(request).await;
        } else {
            chain.proceed(request, Some(response), self).await;
        }
    }
}
