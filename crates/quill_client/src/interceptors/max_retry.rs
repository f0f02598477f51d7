//! Retry budget enforcement.

use crate::chain::{Interceptor, RequestChain};
use crate::error::ClientError;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use quill_core::Operation;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Fails the chain once it has been restarted more often than allowed.
///
/// Sits at the head of the pipeline: every pass through the chain enters it
/// once, so its entry count is the attempt count.
pub struct MaxRetryInterceptor {
    max_retries: u32,
    hits: AtomicU32,
}

impl MaxRetryInterceptor {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            hits: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl<Op: Operation> Interceptor<Op> for MaxRetryInterceptor {
    fn id(&self) -> &str {
        "quill.max-retry"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        let attempt = self.hits.fetch_add(1, Ordering::SeqCst);
        if attempt > self.max_retries {
            chain
                .handle_error(
                    ClientError::TooManyRetries(self.max_retries),
                    request,
                    response,
                )
                .await;
        } else {
            chain.proceed(request, response, self).await;
        }
    }
}
