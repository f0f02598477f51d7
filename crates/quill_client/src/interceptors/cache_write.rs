//! Normalizing server responses back into the store.

use crate::chain::{Interceptor, RequestChain};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::{Operation, ResultSource};
use quill_store::NormalizedStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Publishes successfully parsed server payloads into the normalized store,
/// tagging the publish with the request's context identifier so watchers can
/// recognize their own writes.
pub struct CacheWriteInterceptor {
    store: Arc<NormalizedStore>,
}

impl CacheWriteInterceptor {
    pub fn new(store: Arc<NormalizedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<Op: Operation> Interceptor<Op> for CacheWriteInterceptor {
    fn id(&self) -> &str {
        "quill.cache-write"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        mut response: Option<HttpResponse<Op>>,
    ) {
        if let Some(response) = response.as_mut() {
            let payload = response.envelope.as_ref().and_then(|envelope| {
                match (&envelope.data, response.parsed.as_ref()) {
                    (Some(Value::Object(payload)), Some(parsed))
                        if parsed.source == ResultSource::Server
                            && request.cache_policy.writes_to_cache() =>
                    {
                        Some(payload.clone())
                    }
                    _ => None,
                }
            });
            if let Some(payload) = payload {
                let touched = self
                    .store
                    .write_operation_response::<Op>(&payload, request.context_identifier);
                debug!(operation = Op::NAME, records = touched.len(), "response cached");
                if let Some(parsed) = response.parsed.as_mut() {
                    parsed.dependent_keys = Some(touched);
                }
            }
        }
        chain.proceed(request, response, self).await;
    }
}
