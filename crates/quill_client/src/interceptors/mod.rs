//! Standard interceptors and interceptor providers.
//!
//! The default chain for every operation is, in order: retry budget, cache
//! read, network fetch, response-code check, multipart parse, JSON parse,
//! automatic persisted queries, cache write. Custom stages layer on top of a
//! provider through [`LayeredInterceptorProvider`] rather than replacing the
//! default list.

mod apq;
mod cache_read;
mod cache_write;
mod json_parse;
mod max_retry;
mod multipart_parse;
mod network_fetch;
mod response_code;

pub use apq::AutomaticPersistedQueryInterceptor;
pub use cache_read::CacheReadInterceptor;
pub use cache_write::CacheWriteInterceptor;
pub use json_parse::JsonResponseParsingInterceptor;
pub use max_retry::MaxRetryInterceptor;
pub use multipart_parse::MultipartResponseParsingInterceptor;
pub use network_fetch::NetworkFetchInterceptor;
pub use response_code::ResponseCodeInterceptor;

use crate::chain::{ChainErrorInterceptor, Interceptor};
use crate::session::HttpSession;
use quill_core::Operation;
use quill_store::NormalizedStore;
use std::sync::Arc;

/// Builds the interceptor pipeline for each operation.
///
/// Providers are consulted once per request; stateful interceptors like the
/// retry budget must be freshly constructed per call.
pub trait InterceptorProvider: Send + Sync {
    fn interceptors_for<Op: Operation>(&self, operation: &Op) -> Vec<Arc<dyn Interceptor<Op>>>;

    /// An additional error interceptor given the chance to recover before
    /// terminal delivery.
    fn error_interceptor_for<Op: Operation>(
        &self,
        _operation: &Op,
    ) -> Option<Arc<dyn ChainErrorInterceptor<Op>>> {
        None
    }
}

/// The standard pipeline over a store and an HTTP session.
pub struct DefaultInterceptorProvider {
    store: Arc<NormalizedStore>,
    session: Arc<dyn HttpSession>,
    max_retries: u32,
}

impl DefaultInterceptorProvider {
    pub fn new(store: Arc<NormalizedStore>, session: Arc<dyn HttpSession>) -> Self {
        Self {
            store,
            session,
            max_retries: 3,
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl InterceptorProvider for DefaultInterceptorProvider {
    fn interceptors_for<Op: Operation>(&self, _operation: &Op) -> Vec<Arc<dyn Interceptor<Op>>> {
        vec![
            Arc::new(MaxRetryInterceptor::new(self.max_retries)),
            Arc::new(CacheReadInterceptor::new(self.store.clone())),
            Arc::new(NetworkFetchInterceptor::new(self.session.clone())),
            Arc::new(ResponseCodeInterceptor),
            Arc::new(MultipartResponseParsingInterceptor),
            Arc::new(JsonResponseParsingInterceptor),
            Arc::new(AutomaticPersistedQueryInterceptor),
            Arc::new(CacheWriteInterceptor::new(self.store.clone())),
        ]
    }
}

/// Extra stages contributed around a base provider's list.
pub trait InterceptorLayer: Send + Sync {
    fn leading<Op: Operation>(&self, _operation: &Op) -> Vec<Arc<dyn Interceptor<Op>>> {
        Vec::new()
    }

    fn trailing<Op: Operation>(&self, _operation: &Op) -> Vec<Arc<dyn Interceptor<Op>>> {
        Vec::new()
    }
}

/// Decorates a provider with custom leading and trailing interceptors.
pub struct LayeredInterceptorProvider<P, L> {
    base: P,
    layer: L,
}

impl<P: InterceptorProvider, L: InterceptorLayer> LayeredInterceptorProvider<P, L> {
    pub fn new(base: P, layer: L) -> Self {
        Self { base, layer }
    }
}

impl<P: InterceptorProvider, L: InterceptorLayer> InterceptorProvider
    for LayeredInterceptorProvider<P, L>
{
    fn interceptors_for<Op: Operation>(&self, operation: &Op) -> Vec<Arc<dyn Interceptor<Op>>> {
        let mut interceptors = self.layer.leading(operation);
        interceptors.extend(self.base.interceptors_for(operation));
        interceptors.extend(self.layer.trailing(operation));
        interceptors
    }

    fn error_interceptor_for<Op: Operation>(
        &self,
        operation: &Op,
    ) -> Option<Arc<dyn ChainErrorInterceptor<Op>>> {
        self.base.error_interceptor_for(operation)
    }
}
