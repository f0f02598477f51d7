//! The interceptor request chain.
//!
//! Every operation runs through one [`RequestChain`]: an ordered pipeline of
//! interceptors driving the request from kickoff through cache interaction,
//! network I/O, parsing and cache writes. Each chain serializes its own
//! transitions; separate chains run in parallel.

use crate::error::ClientError;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::{GraphQLResult, Operation};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// What a chain delivers to its caller, possibly more than once for
/// multipart operations.
pub type InterceptorResult<Op> = Result<GraphQLResult<<Op as Operation>::Data>, ClientError>;

/// The caller's completion handler.
pub type Completion<Op> = Arc<dyn Fn(InterceptorResult<Op>) + Send + Sync>;

/// One stage of the request pipeline.
///
/// An interceptor does exactly one of: forward via [`RequestChain::proceed`],
/// short-circuit via [`RequestChain::complete`], fail via
/// [`RequestChain::handle_error`], or restart via [`RequestChain::retry`].
#[async_trait]
pub trait Interceptor<Op: Operation>: Send + Sync {
    /// Stable identity within one chain, used to resolve this interceptor's
    /// position when it forwards.
    fn id(&self) -> &str;

    async fn intercept(
        &self,
        chain: &Arc<RequestChain<Op>>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    );

    /// Interceptors that can react to cancellation return themselves here;
    /// the chain invokes [`CancelableInterceptor::on_cancel`] on caller
    /// cancellation, in reverse declaration order.
    fn as_cancelable(&self) -> Option<&dyn CancelableInterceptor> {
        None
    }
}

/// The cancellation capability an interceptor may opt into.
pub trait CancelableInterceptor: Send + Sync {
    fn on_cancel(&self);
}

/// Receives errors before terminal delivery, with the chance to recover by
/// retrying or completing with a different result.
#[async_trait]
pub trait ChainErrorInterceptor<Op: Operation>: Send + Sync {
    async fn handle_error(
        &self,
        chain: &Arc<RequestChain<Op>>,
        error: ClientError,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    );
}

/// A handle that can abort in-flight work.
pub trait Cancelable: Send + Sync {
    fn cancel(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

/// The ordered execution of interceptors for one operation.
///
/// The chain holds strong references to its interceptors and completion;
/// interceptors never hold the chain. Once the terminal completion fires (or
/// the chain is cancelled) both are dropped, so the only thing keeping a
/// finished chain alive is the caller's handle.
pub struct RequestChain<Op: Operation> {
    interceptors: Mutex<Vec<Arc<dyn Interceptor<Op>>>>,
    positions: FxHashMap<String, usize>,
    state: Mutex<ChainState>,
    // Index of the interceptor most recently dispatched; the fallback cursor
    // for interceptors that forward without identifying themselves.
    current_index: AtomicUsize,
    retry_count: AtomicU32,
    completion: Mutex<Option<Completion<Op>>>,
    error_interceptor: Option<Arc<dyn ChainErrorInterceptor<Op>>>,
}

impl<Op: Operation> RequestChain<Op> {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor<Op>>>) -> Arc<Self> {
        Self::with_error_interceptor(interceptors, None)
    }

    pub fn with_error_interceptor(
        interceptors: Vec<Arc<dyn Interceptor<Op>>>,
        error_interceptor: Option<Arc<dyn ChainErrorInterceptor<Op>>>,
    ) -> Arc<Self> {
        let positions = interceptors
            .iter()
            .enumerate()
            .map(|(index, interceptor)| (interceptor.id().to_string(), index))
            .collect();
        Arc::new(Self {
            interceptors: Mutex::new(interceptors),
            positions,
            state: Mutex::new(ChainState::NotStarted),
            current_index: AtomicUsize::new(0),
            retry_count: AtomicU32::new(0),
            completion: Mutex::new(None),
            error_interceptor,
        })
    }

    /// Starts the chain on a background task and returns immediately. The
    /// chain delivers through `completion`: exactly one terminal call,
    /// except for multipart streams (one call per part) and
    /// cache-and-network fetches (one call per source).
    pub fn kickoff(
        self: &Arc<Self>,
        request: HttpRequest<Op>,
        completion: impl Fn(InterceptorResult<Op>) + Send + Sync + 'static,
    ) {
        {
            let mut state = self.state.lock();
            if *state != ChainState::NotStarted {
                return;
            }
            *state = ChainState::InProgress;
        }
        *self.completion.lock() = Some(Arc::new(completion));

        let chain = Arc::clone(self);
        tokio::spawn(async move {
            if chain.interceptors.lock().is_empty() {
                chain
                    .handle_error(ClientError::NoInterceptors, request, None)
                    .await;
            } else {
                chain.dispatch(0, request, None).await;
            }
        });
    }

    /// Advances to the interceptor after `from`.
    ///
    /// Forwarding advances exactly one position past the caller's own slot;
    /// past the last interceptor the parsed result of the response is
    /// delivered (or [`ClientError::NoParsedResponse`] when absent).
    pub async fn proceed(
        self: &Arc<Self>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
        from: &dyn Interceptor<Op>,
    ) {
        let next = match self.positions.get(from.id()) {
            Some(position) => position + 1,
            // Unknown id: fall back to the entry cursor.
            None => self.current_index.load(Ordering::SeqCst) + 1,
        };
        self.dispatch(next, request, response).await;
    }

    /// Legacy forwarding for interceptors that do not identify themselves:
    /// advances from the position recorded when the current interceptor was
    /// entered.
    pub async fn proceed_from_entry(
        self: &Arc<Self>,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        let next = self.current_index.load(Ordering::SeqCst) + 1;
        self.dispatch(next, request, response).await;
    }

    /// Restarts the chain from the first interceptor with the same chain
    /// instance. The retry budget is enforced by the max-retry interceptor
    /// re-entering at position zero.
    pub async fn retry(self: &Arc<Self>, request: HttpRequest<Op>) {
        if self.is_terminal() {
            return;
        }
        let attempt = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(attempt, operation = Op::NAME, "retrying request chain");
        self.dispatch(0, request, None).await;
    }

    async fn dispatch(
        self: &Arc<Self>,
        index: usize,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        if self.is_terminal() {
            return;
        }
        let interceptor = self.interceptors.lock().get(index).cloned();
        match interceptor {
            Some(interceptor) => {
                self.current_index.store(index, Ordering::SeqCst);
                trace!(id = interceptor.id(), index, "entering interceptor");
                interceptor.intercept(self, request, response).await;
            }
            None => match response {
                Some(mut response) => {
                    let terminal = response.is_final_part;
                    match response.parsed.take() {
                        Some(result) => self.deliver(Ok(result), terminal),
                        None => {
                            self.handle_error(
                                ClientError::NoParsedResponse,
                                request,
                                Some(response),
                            )
                            .await
                        }
                    }
                }
                None => {
                    self.handle_error(ClientError::NoParsedResponse, request, None)
                        .await
                }
            },
        }
    }

    /// Routes an error through the additional error interceptor when one is
    /// attached, otherwise fails the chain terminally.
    pub async fn handle_error(
        self: &Arc<Self>,
        error: ClientError,
        request: HttpRequest<Op>,
        response: Option<HttpResponse<Op>>,
    ) {
        if self.is_terminal() {
            return;
        }
        match self.error_interceptor.clone() {
            Some(interceptor) => {
                debug!(%error, "routing error through the additional error interceptor");
                interceptor.handle_error(self, error, request, response).await;
            }
            None => self.complete(Err(error)),
        }
    }

    /// Delivers a terminal result and collapses the chain.
    pub fn complete(&self, result: InterceptorResult<Op>) {
        self.deliver(result, true);
    }

    /// Delivers a result to the caller. Non-terminal deliveries (cache data
    /// ahead of a network fetch, multipart parts with more behind them)
    /// leave the chain running; the terminal delivery clears the completion
    /// and the interceptor list.
    pub fn deliver(&self, result: InterceptorResult<Op>, terminal: bool) {
        // The completion is read under the state lock so that a racing
        // cancel can never observe a terminal state with the completion
        // still in place, or vice versa.
        let completion = {
            let mut state = self.state.lock();
            if matches!(*state, ChainState::Completed | ChainState::Cancelled) {
                return;
            }
            let mut completion = self.completion.lock();
            if terminal {
                *state = ChainState::Completed;
                completion.take()
            } else {
                completion.clone()
            }
        };
        if terminal {
            self.interceptors.lock().clear();
        }
        if let Some(completion) = completion {
            completion(result);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.lock() == ChainState::Cancelled
    }

    fn is_terminal(&self) -> bool {
        matches!(
            *self.state.lock(),
            ChainState::Completed | ChainState::Cancelled
        )
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }
}

impl<Op: Operation> Cancelable for RequestChain<Op> {
    /// Marks the chain cancelled, notifies cancellation-aware interceptors
    /// in reverse order and suppresses every subsequent completion. Safe to
    /// call from inside an interceptor; no lock is held across callbacks.
    fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if matches!(*state, ChainState::Completed | ChainState::Cancelled) {
                return;
            }
            *state = ChainState::Cancelled;
            self.completion.lock().take();
        }
        debug!(operation = Op::NAME, "request chain cancelled");
        let interceptors = self.interceptors.lock().clone();
        for interceptor in interceptors.iter().rev() {
            if let Some(cancelable) = interceptor.as_cancelable() {
                cancelable.on_cancel();
            }
        }
        self.interceptors.lock().clear();
    }
}
