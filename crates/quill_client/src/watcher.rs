//! Live query watching.

use crate::chain::{Cancelable, Completion, InterceptorResult, RequestChain};
use crate::client::QuillClient;
use crate::interceptors::{DefaultInterceptorProvider, InterceptorProvider};
use crate::request::CachePolicy;
use parking_lot::Mutex;
use quill_core::{CacheKey, Operation};
use quill_store::{NormalizedStore, StoreSubscriber, SubscriptionToken};
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tracing::debug;
use uuid::Uuid;

/// Watches one query and re-delivers its result whenever a store publish
/// touches any cache key the last result depended on.
///
/// The watcher tags its own fetches with a context identifier, so the cache
/// write of a fetch it initiated never triggers another fetch.
pub struct QueryWatcher<Op: Operation, P: InterceptorProvider + 'static = DefaultInterceptorProvider>
{
    client: Arc<QuillClient<P>>,
    operation: Op,
    refetch_policy: CachePolicy,
    context_identifier: Uuid,
    handler: Mutex<Option<Completion<Op>>>,
    last_dependent_keys: Mutex<HashSet<CacheKey>>,
    in_flight: Mutex<Option<Arc<RequestChain<Op>>>>,
    token: Mutex<Option<SubscriptionToken>>,
    self_weak: Weak<Self>,
}

impl<Op: Operation, P: InterceptorProvider + 'static> QueryWatcher<Op, P> {
    pub(crate) fn new(
        client: Arc<QuillClient<P>>,
        operation: Op,
        refetch_policy: CachePolicy,
        handler: Completion<Op>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            client,
            operation,
            refetch_policy,
            context_identifier: Uuid::new_v4(),
            handler: Mutex::new(Some(handler)),
            last_dependent_keys: Mutex::new(HashSet::new()),
            in_flight: Mutex::new(None),
            token: Mutex::new(None),
            self_weak: self_weak.clone(),
        })
    }

    pub(crate) fn subscribe_to_store(self: &Arc<Self>) {
        let token = self
            .client
            .store()
            .subscribe(Arc::downgrade(self) as Weak<dyn StoreSubscriber>);
        *self.token.lock() = Some(token);
    }

    /// Submits the operation and routes its results through the handler.
    pub fn fetch(&self, cache_policy: CachePolicy) {
        let weak = self.self_weak.clone();
        let chain = self.client.transport().send(
            self.operation.clone(),
            cache_policy,
            Some(self.context_identifier),
            move |result: InterceptorResult<Op>| {
                let Some(watcher) = weak.upgrade() else {
                    return;
                };
                if let Ok(result) = &result {
                    if let Some(keys) = &result.dependent_keys {
                        *watcher.last_dependent_keys.lock() = keys.clone();
                    }
                }
                let handler = watcher.handler.lock().clone();
                if let Some(handler) = handler {
                    handler(result);
                }
            },
        );
        *self.in_flight.lock() = Some(chain);
    }

    pub fn dependent_keys(&self) -> HashSet<CacheKey> {
        self.last_dependent_keys.lock().clone()
    }
}

impl<Op: Operation, P: InterceptorProvider + 'static> StoreSubscriber for QueryWatcher<Op, P> {
    fn store_did_change(
        &self,
        _store: &NormalizedStore,
        changed_keys: &HashSet<CacheKey>,
        context_identifier: Option<Uuid>,
    ) {
        // A write this watcher initiated itself is not news.
        if context_identifier == Some(self.context_identifier) {
            return;
        }
        let interested = {
            let keys = self.last_dependent_keys.lock();
            changed_keys.iter().any(|key| keys.contains(key))
        };
        if !interested {
            return;
        }
        debug!(operation = Op::NAME, "watched keys changed; refetching");
        self.fetch(self.refetch_policy);
    }
}

impl<Op: Operation, P: InterceptorProvider + 'static> Cancelable for QueryWatcher<Op, P> {
    /// Detaches the store subscription, cancels any in-flight chain and
    /// releases the handler.
    fn cancel(&self) {
        if let Some(token) = self.token.lock().take() {
            self.client.store().unsubscribe(token);
        }
        if let Some(chain) = self.in_flight.lock().take() {
            chain.cancel();
        }
        *self.handler.lock() = None;
    }
}
