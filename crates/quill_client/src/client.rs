//! The client facade and its request-chain transport.

use crate::chain::{InterceptorResult, RequestChain};
use crate::error::ClientError;
use crate::interceptors::{DefaultInterceptorProvider, InterceptorProvider};
use crate::request::{ApqPhase, CachePolicy, HttpRequest, UploadFile};
use crate::session::HyperSession;
use crate::upload::build_upload_body;
use crate::watcher::QueryWatcher;
use indexmap::IndexMap;
use quill_core::Operation;
use quill_store::NormalizedStore;
use std::sync::Arc;
use uuid::Uuid;

/// Sends operations by building a fresh interceptor chain per request.
pub struct RequestChainTransport<P: InterceptorProvider = DefaultInterceptorProvider> {
    endpoint: String,
    provider: P,
    additional_headers: IndexMap<String, String>,
    auto_persisted_queries: bool,
}

impl<P: InterceptorProvider> RequestChainTransport<P> {
    pub fn new(endpoint: impl Into<String>, provider: P) -> Self {
        Self {
            endpoint: endpoint.into(),
            provider,
            additional_headers: IndexMap::new(),
            auto_persisted_queries: false,
        }
    }

    /// Headers attached to every request. They override every default header
    /// except `Accept`.
    pub fn additional_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }

    /// Enables hash-first persisted queries for queries and mutations.
    pub fn auto_persisted_queries(mut self, enabled: bool) -> Self {
        self.auto_persisted_queries = enabled;
        self
    }

    /// Kicks off `operation` and returns the chain as a cancelable handle.
    pub fn send<Op: Operation>(
        &self,
        operation: Op,
        cache_policy: CachePolicy,
        context_identifier: Option<Uuid>,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Arc<RequestChain<Op>> {
        let mut request = HttpRequest::new(self.endpoint.clone(), operation);
        request.cache_policy = cache_policy;
        request.context_identifier = context_identifier;
        for (name, value) in &self.additional_headers {
            request.add_header(name.clone(), value.clone());
        }
        if self.auto_persisted_queries && !Op::KIND.accepts_multipart() {
            request.apq_phase = ApqPhase::HashOnly;
        }

        let chain = RequestChain::with_error_interceptor(
            self.provider.interceptors_for(&request.operation),
            self.provider.error_interceptor_for(&request.operation),
        );
        chain.kickoff(request, completion);
        chain
    }

    /// Kicks off an upload mutation carrying `files` as a multipart form.
    pub fn upload<Op: Operation>(
        &self,
        operation: Op,
        files: &[UploadFile],
        context_identifier: Option<Uuid>,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Result<Arc<RequestChain<Op>>, ClientError> {
        let (content_type, body) = build_upload_body(&operation, files)?;
        let mut request = HttpRequest::new(self.endpoint.clone(), operation);
        request.cache_policy = CachePolicy::FetchIgnoringCacheData;
        request.context_identifier = context_identifier;
        request.override_body(content_type, body);
        for (name, value) in &self.additional_headers {
            request.add_header(name.clone(), value.clone());
        }

        let chain = RequestChain::with_error_interceptor(
            self.provider.interceptors_for(&request.operation),
            self.provider.error_interceptor_for(&request.operation),
        );
        chain.kickoff(request, completion);
        Ok(chain)
    }
}

/// A GraphQL client: one normalized store plus a transport.
///
/// # Example
///
/// ```ignore
/// let client = QuillClient::new("http://localhost:4000/graphql");
/// client.fetch(HeroQuery, CachePolicy::default(), |result| {
///     match result {
///         Ok(result) => println!("{:?}", result.data),
///         Err(error) => eprintln!("{error}"),
///     }
/// });
/// ```
pub struct QuillClient<P: InterceptorProvider = DefaultInterceptorProvider> {
    store: Arc<NormalizedStore>,
    transport: RequestChainTransport<P>,
}

impl QuillClient<DefaultInterceptorProvider> {
    /// A client over the hyper session with the default interceptor
    /// pipeline and an empty in-memory store.
    pub fn new(endpoint: impl Into<String>) -> Arc<Self> {
        let store = Arc::new(NormalizedStore::new());
        let session = Arc::new(HyperSession::new());
        let provider = DefaultInterceptorProvider::new(store.clone(), session);
        Self::with_transport(store, RequestChainTransport::new(endpoint, provider))
    }
}

impl<P: InterceptorProvider + 'static> QuillClient<P> {
    pub fn with_transport(store: Arc<NormalizedStore>, transport: RequestChainTransport<P>) -> Arc<Self> {
        Arc::new(Self { store, transport })
    }

    pub fn store(&self) -> &Arc<NormalizedStore> {
        &self.store
    }

    pub fn transport(&self) -> &RequestChainTransport<P> {
        &self.transport
    }

    /// Fetches a query with the given cache policy.
    pub fn fetch<Op: Operation>(
        &self,
        operation: Op,
        cache_policy: CachePolicy,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Arc<RequestChain<Op>> {
        self.transport.send(operation, cache_policy, None, completion)
    }

    /// Performs a mutation; mutations never read the cache but their
    /// responses are written back to it.
    pub fn perform_mutation<Op: Operation>(
        &self,
        operation: Op,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Arc<RequestChain<Op>> {
        self.transport
            .send(operation, CachePolicy::FetchIgnoringCacheData, None, completion)
    }

    /// Starts a subscription; the completion fires once per streamed payload.
    pub fn subscribe<Op: Operation>(
        &self,
        operation: Op,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Arc<RequestChain<Op>> {
        self.transport
            .send(operation, CachePolicy::FetchIgnoringCacheData, None, completion)
    }

    /// Uploads files alongside a mutation.
    pub fn upload<Op: Operation>(
        &self,
        operation: Op,
        files: &[UploadFile],
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Result<Arc<RequestChain<Op>>, ClientError> {
        self.transport.upload(operation, files, None, completion)
    }

    /// Watches a query: fetches it with `initial_policy`, then re-fetches
    /// with `refetch_policy` whenever a store change intersects the result's
    /// dependent keys. Cancel the returned watcher to stop.
    pub fn watch<Op: Operation>(
        self: &Arc<Self>,
        operation: Op,
        initial_policy: CachePolicy,
        refetch_policy: CachePolicy,
        handler: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) -> Arc<QueryWatcher<Op, P>> {
        let watcher = QueryWatcher::new(
            Arc::clone(self),
            operation,
            refetch_policy,
            Arc::new(handler),
        );
        watcher.subscribe_to_store();
        watcher.fetch(initial_policy);
        watcher
    }

    pub fn clear_cache(&self) {
        self.store.clear();
    }
}
