//! GraphQL client for Quill.
//!
//! Every operation runs through an interceptor request chain: cache read,
//! network fetch, response validation, (multipart) parsing, automatic
//! persisted queries and cache write, in that order, with cancellation and
//! retry built into the chain itself. Query watchers bridge results to the
//! normalized store's change notifications for live re-execution.
//!
//! # Sending a query
//!
//! ```ignore
//! use quill_client::{CachePolicy, QuillClient};
//!
//! let client = QuillClient::new("http://localhost:4000/graphql");
//! let handle = client.fetch(HeroQuery, CachePolicy::default(), |result| {
//!     println!("{result:?}");
//! });
//! // handle.cancel() aborts the in-flight chain.
//! ```

mod chain;
mod client;
mod error;
pub mod interceptors;
mod multipart;
mod request;
mod response;
mod session;
pub mod testing;
mod upload;
mod watcher;

pub use chain::{
    Cancelable, CancelableInterceptor, ChainErrorInterceptor, Completion, Interceptor,
    InterceptorResult, RequestChain,
};
pub use client::{QuillClient, RequestChainTransport};
pub use error::ClientError;
pub use multipart::{boundary_parameter, parse_multipart_body, MultipartEvent};
pub use request::{accept_header, operation_hash, ApqPhase, CachePolicy, HttpRequest, UploadFile};
pub use response::HttpResponse;
pub use session::{HttpSession, HyperSession, SessionError, SessionResponse};
pub use upload::build_upload_body;
pub use watcher::QueryWatcher;
