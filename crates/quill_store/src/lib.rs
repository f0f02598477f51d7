//! Normalized cache for the Quill GraphQL client.
//!
//! Responses are stored by object identity rather than by query shape: each
//! object lives in one [`quill_core::Record`] under its cache key, and query
//! results are re-assembled by executing the operation's selection set
//! against those records. Publishing new records computes the set of changed
//! keys and notifies subscribers in publish order, which is what drives live
//! query re-execution.

mod executor;
mod key_resolver;
mod normalize;
mod store;
mod subscriber;
mod transaction;

pub use executor::{execute_selection_set, ExecutedSelection};
pub use key_resolver::{CacheKeyResolver, IdCacheKeyResolver, PathOnlyCacheKeyResolver};
pub use normalize::normalize_response;
pub use store::{root_key_for, NormalizedStore, StoreError};
pub use subscriber::{StoreSubscriber, SubscriptionToken};
pub use transaction::{ReadTransaction, ReadWriteTransaction};
