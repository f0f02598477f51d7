//! Shared fixtures for request chain integration tests.

use quill_client::interceptors::DefaultInterceptorProvider;
use quill_client::testing::MockSession;
use quill_client::{InterceptorResult, QuillClient, RequestChainTransport};
use quill_core::{Field, Operation, OperationKind, SelectionSet};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, serde::Serialize)]
pub struct NoVariables;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct HeroData {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub name: String,
}

fn hero_selection_set() -> SelectionSet {
    SelectionSet::default()
        .field(Field::leaf("__typename"))
        .field(Field::leaf("name"))
}

#[derive(Clone)]
pub struct MockHeroQuery;

impl Operation for MockHeroQuery {
    type Variables = NoVariables;
    type Data = HeroData;

    const KIND: OperationKind = OperationKind::Query;
    const NAME: &'static str = "MockHero";
    const DOCUMENT: &'static str = "query MockHero { __typename name }";

    fn root_selection_set() -> SelectionSet {
        hero_selection_set()
    }
}

#[derive(Clone)]
pub struct MockHeroSubscription;

impl Operation for MockHeroSubscription {
    type Variables = NoVariables;
    type Data = HeroData;

    const KIND: OperationKind = OperationKind::Subscription;
    const NAME: &'static str = "MockHeroChanged";
    const DOCUMENT: &'static str = "subscription MockHeroChanged { __typename name }";

    fn root_selection_set() -> SelectionSet {
        hero_selection_set()
    }
}

pub const ENDPOINT: &str = "http://localhost:4000/graphql";

/// A client over a scripted session and a fresh store.
pub fn mock_client(session: Arc<MockSession>) -> Arc<QuillClient> {
    let store = Arc::new(quill_store::NormalizedStore::new());
    let provider = DefaultInterceptorProvider::new(store.clone(), session);
    QuillClient::with_transport(store, RequestChainTransport::new(ENDPOINT, provider))
}

/// A completion handler that forwards every delivery into a channel.
pub fn result_channel<Op: Operation>() -> (
    impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<InterceptorResult<Op>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |result| {
            let _ = tx.send(result);
        },
        rx,
    )
}

/// Receives the next delivery or panics after a second.
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a chain delivery")
        .expect("completion channel closed")
}

/// Asserts that nothing more is delivered within a short window.
pub async fn assert_no_more<T>(rx: &mut mpsc::UnboundedReceiver<T>) {
    let outcome =
        tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
    assert!(outcome.is_err(), "received an unexpected extra delivery");
}
