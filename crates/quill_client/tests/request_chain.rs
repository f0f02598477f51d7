//! Integration tests for the interceptor request chain.

mod common;

use common::*;
use async_trait::async_trait;
use quill_client::interceptors::MaxRetryInterceptor;
use quill_client::testing::MockSession;
use quill_client::{
    accept_header, Cancelable, CancelableInterceptor, CachePolicy, ChainErrorInterceptor,
    ClientError, HttpRequest, HttpResponse, Interceptor, RequestChain,
};
use quill_core::{Operation, OperationKind, Record, RecordSet, RecordValue, ResultSource};
use quill_store::NormalizedStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A chain built with no interceptors fails immediately.
#[tokio::test]
async fn test_empty_interceptor_chain_fails_with_no_interceptors() {
    let chain = RequestChain::<MockHeroQuery>::new(Vec::new());
    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    chain.kickoff(HttpRequest::new(ENDPOINT, MockHeroQuery), completion);

    let result = recv(&mut rx).await;
    assert!(matches!(result, Err(ClientError::NoInterceptors)));
}

struct CancellationHandlingInterceptor {
    has_been_cancelled: AtomicBool,
}

#[async_trait]
impl Interceptor<MockHeroQuery> for CancellationHandlingInterceptor {
    fn id(&self) -> &str {
        "test.cancellation-handling"
    }

    // Deliberately never forwards: the chain stays in flight until the
    // caller cancels.
    async fn intercept(
        &self,
        _chain: &Arc<RequestChain<MockHeroQuery>>,
        _request: HttpRequest<MockHeroQuery>,
        _response: Option<HttpResponse<MockHeroQuery>>,
    ) {
    }

    fn as_cancelable(&self) -> Option<&dyn CancelableInterceptor> {
        Some(self)
    }
}

impl CancelableInterceptor for CancellationHandlingInterceptor {
    fn on_cancel(&self) {
        self.has_been_cancelled.store(true, Ordering::SeqCst);
    }
}

struct BlindRetryInterceptor {
    has_been_cancelled: AtomicBool,
}

#[async_trait]
impl Interceptor<MockHeroQuery> for BlindRetryInterceptor {
    fn id(&self) -> &str {
        "test.blind-retry"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        request: HttpRequest<MockHeroQuery>,
        _response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        chain.retry(request).await;
    }
}

/// Cancellation reaches only interceptors that declare the capability, and
/// suppresses the completion.
#[tokio::test]
async fn test_cancellation_is_selective_and_suppresses_completion() {
    let first = Arc::new(CancellationHandlingInterceptor {
        has_been_cancelled: AtomicBool::new(false),
    });
    let second = Arc::new(BlindRetryInterceptor {
        has_been_cancelled: AtomicBool::new(false),
    });
    let chain = RequestChain::<MockHeroQuery>::new(vec![first.clone(), second.clone()]);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    chain.kickoff(HttpRequest::new(ENDPOINT, MockHeroQuery), completion);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    chain.cancel();

    assert!(first.has_been_cancelled.load(Ordering::SeqCst));
    assert!(!second.has_been_cancelled.load(Ordering::SeqCst));
    assert_no_more(&mut rx).await;
}

/// The outbound Accept header always follows the operation kind, even when a
/// caller supplies its own; other caller headers survive.
#[tokio::test]
async fn test_subscription_accept_header_cannot_be_overridden() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "multipart/mixed;boundary=\"graphql\";subscriptionSpec=1.0",
        "--graphql\r\ncontent-type: application/json\r\n\r\n{\"payload\":{\"data\":{\"__typename\":\"Hero\",\"name\":\"R2-D2\"}}}\r\n--graphql--\r\n",
    );

    let store = Arc::new(NormalizedStore::new());
    let provider =
        quill_client::interceptors::DefaultInterceptorProvider::new(store.clone(), session.clone());
    let transport = quill_client::RequestChainTransport::new(ENDPOINT, provider)
        .additional_header("Accept", "multipart/mixed")
        .additional_header("Random", "still-here");
    let client = quill_client::QuillClient::with_transport(store, transport);

    let (completion, mut rx) = result_channel::<MockHeroSubscription>();
    let _handle = client.subscribe(MockHeroSubscription, completion);
    recv(&mut rx).await.unwrap();

    let requests = session.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers.get("Accept").unwrap(),
        &accept_header(OperationKind::Subscription)
    );
    assert_eq!(
        requests[0].headers.get("Accept").unwrap(),
        "multipart/mixed;boundary=\"graphql\";subscriptionSpec=1.0,application/graphql-response+json,application/json"
    );
    assert_eq!(requests[0].headers.get("Random").unwrap(), "still-here");
}

/// A two-part subscription stream delivers one successful result per part.
#[tokio::test]
async fn test_multipart_subscription_delivers_each_chunk() {
    let session = Arc::new(MockSession::new());
    let part = "{\"payload\":{\"data\":{\"__typename\":\"Hero\",\"name\":\"R2-D2\"}}}";
    session.respond_with(
        "multipart/mixed;boundary=\"graphql\";subscriptionSpec=1.0",
        format!(
            "--graphql\r\ncontent-type: application/json\r\n\r\n{part}\r\n--graphql\r\ncontent-type: application/json\r\n\r\n{part}\r\n--graphql--\r\n"
        ),
    );
    let client = mock_client(session);

    let (completion, mut rx) = result_channel::<MockHeroSubscription>();
    let _handle = client.subscribe(MockHeroSubscription, completion);

    for _ in 0..2 {
        let result = recv(&mut rx).await.unwrap();
        assert_eq!(result.source, ResultSource::Server);
        assert_eq!(result.data.unwrap().name, "R2-D2");
    }
    assert_no_more(&mut rx).await;
}

/// A 200 response whose envelope carries only errors is still a success
/// result; the errors ride along.
#[tokio::test]
async fn test_graphql_errors_without_data_are_delivered_as_success() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "application/json",
        r#"{"errors":[{"message":"Bad request, could not start execution!"}]}"#,
    );
    let client = mock_client(session);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let _handle = client.fetch(MockHeroQuery, CachePolicy::FetchIgnoringCacheData, completion);

    let result = recv(&mut rx).await.unwrap();
    assert!(result.data.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message,
        "Bad request, could not start execution!"
    );
}

/// Non-2xx statuses fail before parsing.
#[tokio::test]
async fn test_non_2xx_status_fails_with_invalid_response_code() {
    let session = Arc::new(MockSession::new());
    session.respond_with_status(500, "text/plain", "upstream exploded");
    let client = mock_client(session);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let _handle = client.fetch(MockHeroQuery, CachePolicy::FetchIgnoringCacheData, completion);

    let result = recv(&mut rx).await;
    match result {
        Err(ClientError::InvalidResponseCode { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected invalid response code, got {other:?}"),
    }
}

/// A persisted-query miss retries once with the full document attached.
#[tokio::test]
async fn test_apq_miss_retries_with_full_document() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "application/json",
        r#"{"errors":[{"message":"PersistedQueryNotFound"}]}"#,
    );
    session.respond_with(
        "application/json",
        r#"{"data":{"__typename":"Hero","name":"R2-D2"}}"#,
    );

    let store = Arc::new(NormalizedStore::new());
    let provider =
        quill_client::interceptors::DefaultInterceptorProvider::new(store.clone(), session.clone());
    let transport = quill_client::RequestChainTransport::new(ENDPOINT, provider)
        .auto_persisted_queries(true);
    let client = quill_client::QuillClient::with_transport(store, transport);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let _handle = client.fetch(MockHeroQuery, CachePolicy::FetchIgnoringCacheData, completion);

    let result = recv(&mut rx).await.unwrap();
    assert_eq!(result.data.unwrap().name, "R2-D2");

    let requests = session.requests();
    assert_eq!(requests.len(), 2);
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(first.get("query").is_none());
    assert!(first["extensions"]["persistedQuery"]["sha256Hash"].is_string());
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["query"], MockHeroQuery::DOCUMENT);
}

struct FailingInterceptor;

#[async_trait]
impl Interceptor<MockHeroQuery> for FailingInterceptor {
    fn id(&self) -> &str {
        "test.failing"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        request: HttpRequest<MockHeroQuery>,
        response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        chain
            .handle_error(
                ClientError::Network("connection refused".to_string()),
                request,
                response,
            )
            .await;
    }
}

struct RetryOnNetworkError;

#[async_trait]
impl ChainErrorInterceptor<MockHeroQuery> for RetryOnNetworkError {
    async fn handle_error(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        error: ClientError,
        request: HttpRequest<MockHeroQuery>,
        _response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        match error {
            ClientError::Network(_) => chain.retry(request).await,
            other => chain.complete(Err(other)),
        }
    }
}

/// The retry budget caps blind retry loops.
#[tokio::test]
async fn test_retry_budget_fails_with_too_many_retries() {
    let chain = RequestChain::<MockHeroQuery>::with_error_interceptor(
        vec![
            Arc::new(MaxRetryInterceptor::new(2)),
            Arc::new(FailingInterceptor),
        ],
        Some(Arc::new(RetryOnNetworkError)),
    );

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    chain.kickoff(HttpRequest::new(ENDPOINT, MockHeroQuery), completion);

    let result = recv(&mut rx).await;
    assert!(matches!(result, Err(ClientError::TooManyRetries(2))));
    assert_eq!(chain.retry_count(), 3);
}

struct PublishAndRetryOnCacheMiss {
    store: Arc<NormalizedStore>,
    retried: AtomicBool,
}

#[async_trait]
impl ChainErrorInterceptor<MockHeroQuery> for PublishAndRetryOnCacheMiss {
    async fn handle_error(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        error: ClientError,
        request: HttpRequest<MockHeroQuery>,
        _response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        if matches!(error, ClientError::CacheMiss(_)) && !self.retried.swap(true, Ordering::SeqCst)
        {
            self.store.publish(
                RecordSet::from_iter([Record::new("QUERY_ROOT")
                    .with_field("__typename", RecordValue::scalar("Hero"))
                    .with_field("name", RecordValue::scalar("Han Solo"))]),
                None,
            );
            chain.retry(request).await;
        } else {
            chain.complete(Err(error));
        }
    }
}

/// A cache-only fetch that misses can be retried after the records arrive,
/// on the same chain instance.
#[tokio::test]
async fn test_cache_miss_then_retry_after_publish_delivers_record() {
    let store = Arc::new(NormalizedStore::new());
    let chain = RequestChain::<MockHeroQuery>::with_error_interceptor(
        vec![Arc::new(quill_client::interceptors::CacheReadInterceptor::new(store.clone()))],
        Some(Arc::new(PublishAndRetryOnCacheMiss {
            store: store.clone(),
            retried: AtomicBool::new(false),
        })),
    );

    let mut request = HttpRequest::new(ENDPOINT, MockHeroQuery);
    request.cache_policy = CachePolicy::ReturnCacheDataDontFetch;
    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    chain.kickoff(request, completion);

    let result = recv(&mut rx).await.unwrap();
    assert_eq!(result.source, ResultSource::Cache);
    assert_eq!(result.data.unwrap().name, "Han Solo");
}

/// Cache-and-network delivers exactly one result per source.
#[tokio::test]
async fn test_return_cache_data_and_fetch_delivers_both_sources_once() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "application/json",
        r#"{"data":{"__typename":"Hero","name":"Fresh Hero"}}"#,
    );
    let client = mock_client(session);

    client.store().publish(
        RecordSet::from_iter([Record::new("QUERY_ROOT")
            .with_field("__typename", RecordValue::scalar("Hero"))
            .with_field("name", RecordValue::scalar("Stale Hero"))]),
        None,
    );

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let _handle = client.fetch(MockHeroQuery, CachePolicy::ReturnCacheDataAndFetch, completion);

    let cached = recv(&mut rx).await.unwrap();
    assert_eq!(cached.source, ResultSource::Cache);
    assert_eq!(cached.data.unwrap().name, "Stale Hero");

    let fresh = recv(&mut rx).await.unwrap();
    assert_eq!(fresh.source, ResultSource::Server);
    assert_eq!(fresh.data.unwrap().name, "Fresh Hero");

    assert_no_more(&mut rx).await;
}

/// After the terminal completion, the caller's handle is the only thing
/// keeping the chain alive.
#[tokio::test]
async fn test_chain_is_released_once_handle_drops_after_completion() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "application/json",
        r#"{"data":{"__typename":"Hero","name":"R2-D2"}}"#,
    );
    let client = mock_client(session);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let handle = client.fetch(MockHeroQuery, CachePolicy::FetchIgnoringCacheData, completion);
    recv(&mut rx).await.unwrap();
    // Let the chain's background task unwind its own strong reference.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let weak = Arc::downgrade(&handle);
    assert!(weak.upgrade().is_some(), "handle keeps the chain alive");
    drop(handle);
    assert!(weak.upgrade().is_none(), "dropping the handle releases the chain");
}

struct AnonymousForwardingInterceptor;

#[async_trait]
impl Interceptor<MockHeroQuery> for AnonymousForwardingInterceptor {
    fn id(&self) -> &str {
        "test.anonymous-forwarding"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        request: HttpRequest<MockHeroQuery>,
        response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        // Legacy forwarding: advance from the entry cursor instead of
        // identifying ourselves.
        chain.proceed_from_entry(request, response).await;
    }
}

struct ShortCircuitInterceptor;

#[async_trait]
impl Interceptor<MockHeroQuery> for ShortCircuitInterceptor {
    fn id(&self) -> &str {
        "test.short-circuit"
    }

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<MockHeroQuery>>,
        _request: HttpRequest<MockHeroQuery>,
        _response: Option<HttpResponse<MockHeroQuery>>,
    ) {
        chain.complete(Ok(quill_core::GraphQLResult::from_server(None, Vec::new())));
    }
}

/// An interceptor forwarding without identifying itself still advances
/// exactly one position.
#[tokio::test]
async fn test_legacy_forwarding_advances_from_entry_position() {
    let chain = RequestChain::<MockHeroQuery>::new(vec![
        Arc::new(AnonymousForwardingInterceptor),
        Arc::new(ShortCircuitInterceptor),
    ]);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    chain.kickoff(HttpRequest::new(ENDPOINT, MockHeroQuery), completion);

    let result = recv(&mut rx).await.unwrap();
    assert_eq!(result.source, ResultSource::Server);
    assert_no_more(&mut rx).await;
}

/// Server responses land in the store with the result's dependent keys.
#[tokio::test]
async fn test_cache_write_populates_store_and_dependent_keys() {
    let session = Arc::new(MockSession::new());
    session.respond_with(
        "application/json",
        r#"{"data":{"__typename":"Hero","name":"R2-D2"}}"#,
    );
    let client = mock_client(session);

    let (completion, mut rx) = result_channel::<MockHeroQuery>();
    let _handle = client.fetch(MockHeroQuery, CachePolicy::FetchIgnoringCacheData, completion);

    let result = recv(&mut rx).await.unwrap();
    let keys = result.dependent_keys.expect("server result gains dependent keys");
    assert!(keys.contains(&quill_core::CacheKey::query_root()));

    let cached = client.store().read_operation::<MockHeroQuery>().unwrap();
    assert_eq!(cached.data.unwrap().name, "R2-D2");
}
