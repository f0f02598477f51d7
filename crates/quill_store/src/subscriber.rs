//! Store change subscriptions.

use crate::store::NormalizedStore;
use quill_core::CacheKey;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Receives change notifications from a [`NormalizedStore`].
///
/// Callbacks are delivered in publish order on the store's publish
/// discipline; implementations must not publish back into the store
/// synchronously from the callback. Offload follow-up work (a query watcher
/// spawns its re-fetch).
pub trait StoreSubscriber: Send + Sync {
    fn store_did_change(
        &self,
        store: &NormalizedStore,
        changed_keys: &HashSet<CacheKey>,
        context_identifier: Option<Uuid>,
    );
}

/// Stable opaque identity of one subscription, returned at subscribe time
/// and used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub(crate) u64);

/// The store's subscriber list. Entries are weak so subscriptions never keep
/// a subscriber alive; dead entries are compacted on every publish.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    entries: Vec<(SubscriptionToken, Weak<dyn StoreSubscriber>)>,
    next_token: u64,
}

impl SubscriberRegistry {
    pub(crate) fn subscribe(&mut self, subscriber: Weak<dyn StoreSubscriber>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.entries.push((token, subscriber));
        token
    }

    pub(crate) fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.entries.retain(|(entry_token, _)| *entry_token != token);
    }

    /// Upgrades every live subscriber and drops the dead ones.
    pub(crate) fn collect_live(&mut self) -> Vec<Arc<dyn StoreSubscriber>> {
        let mut live = Vec::with_capacity(self.entries.len());
        self.entries.retain(|(_, weak)| match weak.upgrade() {
            Some(strong) => {
                live.push(strong);
                true
            }
            None => false,
        });
        live
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
