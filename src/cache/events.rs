//! Cache change notifications.
//!
//! Subscribers register a callback per key and receive a [`CacheEvent`]
//! whenever that entry settles, fails, is invalidated or is evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use time::OffsetDateTime;

use super::keys::CacheKey;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "cache::events";

/// Monotonic sequence number of events published by one cache.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A load completed and its value was stored.
    Updated,
    /// A load failed; the entry now holds the error.
    Failed,
    /// The entry was marked stale.
    Invalidated,
    /// The entry was dropped by LRU pressure or `clear()`.
    Evicted,
}

#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub epoch: Epoch,
    pub key: CacheKey,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

pub(crate) type Callback = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

/// Per-key subscriber registry.
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    next_epoch: AtomicU64,
    callbacks: Mutex<HashMap<CacheKey, Vec<(u64, Callback)>>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            next_epoch: AtomicU64::new(1),
            callbacks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn add(&self, key: CacheKey, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        mutex_lock(&self.callbacks, SOURCE, "add")
            .entry(key)
            .or_default()
            .push((id, callback));
        id
    }

    pub(crate) fn remove(&self, key: &CacheKey, id: u64) {
        let mut callbacks = mutex_lock(&self.callbacks, SOURCE, "remove");
        if let Some(list) = callbacks.get_mut(key) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                callbacks.remove(key);
            }
        }
    }

    pub(crate) fn count(&self, key: &CacheKey) -> usize {
        mutex_lock(&self.callbacks, SOURCE, "count")
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Builds the event and runs every callback for its key. The registry
    /// lock is released before any callback runs.
    pub(crate) fn publish(&self, key: &CacheKey, kind: EventKind) {
        let targets: Vec<Callback> = {
            let callbacks = mutex_lock(&self.callbacks, SOURCE, "publish");
            match callbacks.get(key) {
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => return,
            }
        };

        let event = CacheEvent {
            epoch: self.next_epoch.fetch_add(1, Ordering::Relaxed),
            key: key.clone(),
            kind,
            timestamp: OffsetDateTime::now_utc(),
        };
        for callback in targets {
            callback(&event);
        }
    }
}

/// Handle returned by `subscribe`; dropping it removes the callback.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<Subscribers>,
    key: CacheKey,
    id: u64,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<Subscribers>, key: CacheKey, id: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            key,
            id,
            active: true,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.key, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::cache::keys::Resource;

    fn counter(hits: &Arc<AtomicUsize>) -> Callback {
        let hits = Arc::clone(hits);
        Arc::new(move |_event: &CacheEvent| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn publish_reaches_only_matching_key() {
        let registry = Arc::new(Subscribers::new());
        let cart = CacheKey::singleton(Resource::BuyerCart);
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = Subscription::new(&registry, cart.clone(), registry.add(cart.clone(), counter(&hits)));

        registry.publish(&cart, EventKind::Updated);
        registry.publish(&CacheKey::singleton(Resource::AuthMe), EventKind::Updated);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let registry = Arc::new(Subscribers::new());
        let cart = CacheKey::singleton(Resource::BuyerCart);
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = Subscription::new(&registry, cart.clone(), registry.add(cart.clone(), counter(&hits)));
        assert_eq!(registry.count(&cart), 1);

        drop(sub);
        registry.publish(&cart, EventKind::Invalidated);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.count(&cart), 0);
    }

    #[test]
    fn epochs_increase() {
        let registry = Arc::new(Subscribers::new());
        let key = CacheKey::singleton(Resource::AuthMe);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = registry.add(
            key.clone(),
            Arc::new(move |event: &CacheEvent| sink.lock().unwrap().push(event.epoch)),
        );
        let _sub = Subscription::new(&registry, key.clone(), id);

        registry.publish(&key, EventKind::Updated);
        registry.publish(&key, EventKind::Evicted);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0] < seen[1]);
    }
}
