//! Cache read short-circuiting.

use crate::chain::{Interceptor, RequestChain};
use crate::request::{CachePolicy, HttpRequest};
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::{Operation, OperationKind};
use quill_store::NormalizedStore;
use std::sync::Arc;
use tracing::debug;

/// Serves queries from the normalized store according to the request's
/// cache policy.
pub struct CacheReadInterceptor {
    store: Arc<NormalizedStore>,
}

impl CacheReadInterceptor {
    pub fn new(store: Arc<NormalizedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<Op: Operation> Interceptor<Op> for CacheReadInterceptor {
    fn id(&self) -> &str {
        "quill.cache-read"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        if Op::KIND != OperationKind::Query || !request.cache_policy.consults_cache() {
            chain.proceed(request, response, self).await;
            return;
        }

        match self.store.read_operation::<Op>() {
            Ok(result) => {
                debug!(operation = Op::NAME, "cache hit");
                match request.cache_policy {
                    CachePolicy::ReturnCacheDataAndFetch => {
                        // One delivery per source: cached data now, the
                        // network copy when the fetch lands.
                        chain.deliver(Ok(result), false);
                        chain.proceed(request, response, self).await;
                    }
                    _ => chain.complete(Ok(result)),
                }
            }
            Err(store_error) => {
                debug!(operation = Op::NAME, error = %store_error, "cache miss");
                if request.cache_policy == CachePolicy::ReturnCacheDataDontFetch {
                    chain
                        .handle_error(store_error.into(), request, response)
                        .await;
                } else {
                    chain.proceed(request, response, self).await;
                }
            }
        }
    }
}
