//! The normalized store.

use crate::executor::{execute_selection_set, ExecutedSelection};
use crate::key_resolver::{CacheKeyResolver, IdCacheKeyResolver};
use crate::normalize::normalize_response;
use crate::subscriber::{StoreSubscriber, SubscriberRegistry, SubscriptionToken};
use crate::transaction::{ReadTransaction, ReadWriteTransaction};
use parking_lot::{Mutex, RwLock};
use quill_core::{CacheKey, GraphQLResult, Operation, OperationKind, RecordSet, SelectionSet};
use std::collections::HashSet;
use std::sync::Weak;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A selection could not be satisfied from the cache; carries the dotted
    /// response path of the first missing field.
    #[error("cache miss at {0}")]
    CacheMiss(String),
    #[error("cached data did not match the selection set shape: {0}")]
    InvalidData(String),
}

/// Content-addressed storage of GraphQL response fragments.
///
/// All mutation flows through [`NormalizedStore::publish`], which is
/// serialized: merges happen one at a time and subscriber notifications
/// observe publish order. Readers see a point-in-time snapshot for the
/// duration of a single load or transaction.
pub struct NormalizedStore {
    records: RwLock<RecordSet>,
    // Serializes publishes and the notification fan-out that follows them.
    publish_lock: Mutex<()>,
    subscribers: Mutex<SubscriberRegistry>,
    key_resolver: Box<dyn CacheKeyResolver>,
}

impl Default for NormalizedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizedStore {
    pub fn new() -> Self {
        Self::with_key_resolver(Box::new(IdCacheKeyResolver))
    }

    pub fn with_key_resolver(key_resolver: Box<dyn CacheKeyResolver>) -> Self {
        Self {
            records: RwLock::new(RecordSet::new()),
            publish_lock: Mutex::new(()),
            subscribers: Mutex::new(SubscriberRegistry::default()),
            key_resolver,
        }
    }

    /// Loads the subset of `keys` present in the store; missing keys are
    /// simply omitted.
    pub fn load_records(&self, keys: &[CacheKey]) -> RecordSet {
        let records = self.records.read();
        keys.iter()
            .filter_map(|key| records.get(key).cloned())
            .collect()
    }

    /// Merges `records` into the store field-by-field, last write wins, and
    /// notifies every live subscriber whose registration predates the
    /// publish. Returns the set of keys whose content changed; publishes
    /// that change nothing notify nobody.
    pub fn publish(&self, records: RecordSet, identifier: Option<Uuid>) -> HashSet<CacheKey> {
        let _publish_guard = self.publish_lock.lock();
        let changed = {
            let mut store = self.records.write();
            store.merge(records)
        };
        debug!(changed = changed.len(), "store publish");
        if !changed.is_empty() {
            self.notify(&changed, identifier);
        }
        changed
    }

    /// Removes all records. Subscriptions survive a clear.
    pub fn clear(&self) {
        let _publish_guard = self.publish_lock.lock();
        self.records.write().clear();
        debug!("store cleared");
    }

    pub fn subscribe(&self, subscriber: Weak<dyn StoreSubscriber>) -> SubscriptionToken {
        self.subscribers.lock().subscribe(subscriber)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.subscribers.lock().unsubscribe(token);
    }

    /// Executes `selection_set` rooted at `root_key` against the current
    /// snapshot.
    pub fn execute(
        &self,
        root_key: &CacheKey,
        selection_set: &SelectionSet,
    ) -> Result<ExecutedSelection, StoreError> {
        let records = self.records.read();
        execute_selection_set(&records, root_key, selection_set)
    }

    /// Reads an operation's data entirely from the cache.
    pub fn read_operation<Op: Operation>(&self) -> Result<GraphQLResult<Op::Data>, StoreError> {
        let executed = self.execute(&root_key_for(Op::KIND), &Op::root_selection_set())?;
        let data = serde_json::from_value(executed.data.into_value())
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(GraphQLResult::from_cache(data, executed.dependent_keys))
    }

    /// Normalizes a server payload for an operation and publishes the
    /// resulting records. Returns the keys the payload touched, which become
    /// the result's dependent keys.
    pub fn write_operation_response<Op: Operation>(
        &self,
        payload: &serde_json::Map<String, serde_json::Value>,
        identifier: Option<Uuid>,
    ) -> HashSet<CacheKey> {
        let root_key = root_key_for(Op::KIND);
        let records =
            normalize_response(payload, &root_key, &Op::root_selection_set(), self.key_resolver.as_ref());
        let mut touched: HashSet<CacheKey> = records.keys().cloned().collect();
        touched.extend(self.publish(records, identifier));
        touched
    }

    /// Runs `body` over a consistent read-only snapshot.
    pub fn within_read_transaction<R>(&self, body: impl FnOnce(&ReadTransaction<'_>) -> R) -> R {
        let records = self.records.read();
        let transaction = ReadTransaction::new(&records);
        body(&transaction)
    }

    /// Runs `body` with mutable access to records; every write buffered in
    /// the body publishes atomically (one merge, one notification) when the
    /// body returns.
    pub fn within_read_write_transaction<R>(
        &self,
        identifier: Option<Uuid>,
        body: impl FnOnce(&mut ReadWriteTransaction<'_>) -> R,
    ) -> R {
        let _publish_guard = self.publish_lock.lock();
        let (result, pending) = {
            let records = self.records.read();
            let mut transaction =
                ReadWriteTransaction::new(&records, self.key_resolver.as_ref());
            let result = body(&mut transaction);
            (result, transaction.into_pending_writes())
        };

        let changed = {
            let mut store = self.records.write();
            store.merge(pending)
        };
        trace!(changed = changed.len(), "transaction commit");
        if !changed.is_empty() {
            self.notify(&changed, identifier);
        }
        result
    }

    // Notification runs under the publish lock so subscribers observe the
    // total publish order. Callbacks must not publish synchronously.
    fn notify(&self, changed: &HashSet<CacheKey>, identifier: Option<Uuid>) {
        let live = self.subscribers.lock().collect_live();
        for subscriber in live {
            subscriber.store_did_change(self, changed, identifier);
        }
    }
}

/// The cache key under which an operation kind's root object is stored.
pub fn root_key_for(kind: OperationKind) -> CacheKey {
    match kind {
        OperationKind::Query | OperationKind::Subscription => CacheKey::query_root(),
        OperationKind::Mutation => CacheKey::mutation_root(),
    }
}
