//! Keyed query cache with staleness windows and request coalescing.
//!
//! Each key holds at most one in-progress load (a "flight"). Readers that
//! arrive while a flight is running await the same shared future instead of
//! issuing another call. Flights are spawned onto the current tokio runtime
//! when one is available, so a reader that gives up does not prevent the
//! result from landing in the cache.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use metrics::counter;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::config::CacheConfig;
use super::events::{CacheEvent, EventKind, Subscribers, Subscription};
use super::keys::{CacheKey, KeyPattern};
use crate::client::ClientError;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "bazaar_cache_hit_total";
const METRIC_MISS: &str = "bazaar_cache_miss_total";
const METRIC_COALESCED: &str = "bazaar_cache_coalesced_total";
const METRIC_INVALIDATED: &str = "bazaar_cache_invalidated_total";
const METRIC_EVICT: &str = "bazaar_cache_evict_total";

type CachedValue = Arc<dyn Any + Send + Sync>;
type Flight = Shared<BoxFuture<'static, Result<CachedValue, ClientError>>>;

/// Observable state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Fresh,
    Stale,
    InFlight,
    Error,
}

struct InFlight {
    id: u64,
    generation: u64,
    future: Flight,
}

#[derive(Default)]
struct Entry {
    value: Option<CachedValue>,
    error: Option<ClientError>,
    fetched_at: Option<Instant>,
    /// `None` with a value present means the window overflowed `Instant`.
    stale_after: Option<Instant>,
    flight: Option<InFlight>,
    /// Bumped by every invalidation.
    generation: u64,
}

impl Entry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.value.is_some()
            && self.error.is_none()
            && self.stale_after.is_none_or(|deadline| now < deadline)
    }

    fn status(&self, now: Instant) -> EntryStatus {
        if self.flight.is_some() {
            EntryStatus::InFlight
        } else if self.error.is_some() {
            EntryStatus::Error
        } else if self.is_fresh(now) {
            EntryStatus::Fresh
        } else {
            EntryStatus::Stale
        }
    }
}

struct State {
    entries: LruCache<CacheKey, Entry>,
    /// Bumped by `clear()`; flights from an older epoch do not store results.
    epoch: u64,
    next_flight: u64,
}

struct CacheInner {
    config: CacheConfig,
    state: Mutex<State>,
    subscribers: Arc<Subscribers>,
}

enum Found {
    Fresh(CachedValue),
    Running(Flight),
    Superseded(Flight),
    Missing,
}

enum Step {
    Hit(CachedValue),
    Join(Flight),
    Lead(Flight, Option<CacheKey>),
}

/// Shared handle to the query cache. Clones see the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.inner.config)
            .field("len", &self.len())
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = LruCache::new(config.capacity_non_zero());
        Self {
            inner: Arc::new(CacheInner {
                config,
                state: Mutex::new(State {
                    entries,
                    epoch: 0,
                    next_flight: 0,
                }),
                subscribers: Arc::new(Subscribers::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Returns the cached value for `key` when fresh, joins the running load
    /// when there is one, and otherwise starts a load with `loader`.
    ///
    /// A load that was started before an invalidation of `key` is awaited
    /// but its value is not returned; the read then issues a new load.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, loader: F) -> Result<T, ClientError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let step = loop {
            let superseded = {
                let mut state = mutex_lock(&self.inner.state, SOURCE, "read");
                let now = Instant::now();
                let found = match state.entries.get(&key) {
                    Some(entry) => match &entry.flight {
                        Some(flight) if flight.generation == entry.generation => {
                            Found::Running(flight.future.clone())
                        }
                        Some(flight) => Found::Superseded(flight.future.clone()),
                        None => match &entry.value {
                            Some(value) if entry.is_fresh(now) => Found::Fresh(Arc::clone(value)),
                            _ => Found::Missing,
                        },
                    },
                    None => Found::Missing,
                };
                match found {
                    Found::Fresh(value) => break Step::Hit(value),
                    Found::Running(flight) => break Step::Join(flight),
                    Found::Superseded(flight) => flight,
                    Found::Missing => break self.lead(&mut state, &key, loader),
                }
            };
            trace!(target: SOURCE, key = %key, "awaiting superseded load");
            let _ = superseded.await;
        };

        let resource = key.resource.name();
        let value = match step {
            Step::Hit(value) => {
                counter!(METRIC_HIT, "resource" => resource).increment(1);
                value
            }
            Step::Join(flight) => {
                counter!(METRIC_COALESCED, "resource" => resource).increment(1);
                flight.await?
            }
            Step::Lead(flight, evicted) => {
                counter!(METRIC_MISS, "resource" => resource).increment(1);
                if let Some(evicted) = evicted {
                    self.evicted(&evicted);
                }
                flight.await?
            }
        };
        downcast(&key, value)
    }

    /// Installs a new flight for `key`. Runs under the state lock.
    fn lead<T, F, Fut>(&self, state: &mut State, key: &CacheKey, loader: F) -> Step
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let mut evicted = None;
        if !state.entries.contains(key) {
            if let Some((old, _)) = state.entries.push(key.clone(), Entry::default()) {
                if &old != key {
                    evicted = Some(old);
                }
            }
        }

        state.next_flight += 1;
        let id = state.next_flight;
        let epoch = state.epoch;
        let generation = state.entries.peek(key).map_or(0, |entry| entry.generation);
        let window = self.inner.config.stale_window(key.resource);

        let inner = Arc::clone(&self.inner);
        let flight_key = key.clone();
        let future = async move {
            let result = loader().await.map(|value| Arc::new(value) as CachedValue);
            inner.settle(&flight_key, epoch, id, window, &result);
            result
        }
        .boxed()
        .shared();

        if let Some(entry) = state.entries.peek_mut(key) {
            entry.flight = Some(InFlight {
                id,
                generation,
                future: future.clone(),
            });
        }
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(future.clone());
        }
        debug!(target: SOURCE, key = %key, flight = id, "cache load started");
        Step::Lead(future, evicted)
    }

    /// Marks `key` stale. A running flight is superseded: its result is
    /// stored as already stale and the next read loads again.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.invalidate_where(|candidate| candidate == key) > 0
    }

    /// Invalidates every key whose resource is `prefix` or nested beneath it.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.invalidate_where(|key| key.resource.is_under(prefix))
    }

    pub fn invalidate_pattern(&self, pattern: &KeyPattern) -> usize {
        self.invalidate_where(|key| pattern.matches(key))
    }

    fn invalidate_where(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let invalidated: Vec<CacheKey> = {
            let mut state = mutex_lock(&self.inner.state, SOURCE, "invalidate");
            let now = Instant::now();
            state
                .entries
                .iter_mut()
                .filter(|(key, _)| predicate(key))
                .map(|(key, entry)| {
                    entry.generation += 1;
                    entry.stale_after = Some(now);
                    key.clone()
                })
                .collect()
        };

        for key in &invalidated {
            counter!(METRIC_INVALIDATED, "resource" => key.resource.name()).increment(1);
            debug!(target: SOURCE, key = %key, "cache entry invalidated");
            self.inner.subscribers.publish(key, EventKind::Invalidated);
        }
        invalidated.len()
    }

    /// Drops every entry. Flights started before the clear still resolve for
    /// their awaiting readers but do not repopulate the cache.
    pub fn clear(&self) {
        let dropped: Vec<CacheKey> = {
            let mut state = mutex_lock(&self.inner.state, SOURCE, "clear");
            state.epoch += 1;
            let mut dropped = Vec::with_capacity(state.entries.len());
            while let Some((key, _)) = state.entries.pop_lru() {
                dropped.push(key);
            }
            dropped
        };
        debug!(target: SOURCE, entries = dropped.len(), "cache cleared");
        for key in &dropped {
            self.inner.subscribers.publish(key, EventKind::Evicted);
        }
    }

    /// Registers `callback` for events on `key`. The callback runs outside
    /// cache locks and may call back into the cache.
    pub fn subscribe<F>(&self, key: CacheKey, callback: F) -> Subscription
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let id = self.inner.subscribers.add(key.clone(), Arc::new(callback));
        Subscription::new(&self.inner.subscribers, key, id)
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        self.inner.subscribers.count(key)
    }

    pub fn status(&self, key: &CacheKey) -> Option<EntryStatus> {
        let state = mutex_lock(&self.inner.state, SOURCE, "status");
        let now = Instant::now();
        state.entries.peek(key).map(|entry| entry.status(now))
    }

    /// When the current value of `key` was fetched.
    pub fn fetched_at(&self, key: &CacheKey) -> Option<Instant> {
        mutex_lock(&self.inner.state, SOURCE, "fetched_at")
            .entries
            .peek(key)
            .and_then(|entry| entry.fetched_at)
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.state, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evicted(&self, key: &CacheKey) {
        counter!(METRIC_EVICT, "resource" => key.resource.name()).increment(1);
        debug!(target: SOURCE, key = %key, "cache entry evicted");
        self.inner.subscribers.publish(key, EventKind::Evicted);
    }
}

impl CacheInner {
    fn settle(
        &self,
        key: &CacheKey,
        epoch: u64,
        flight_id: u64,
        window: Duration,
        result: &Result<CachedValue, ClientError>,
    ) {
        let kind = {
            let mut state = mutex_lock(&self.state, SOURCE, "settle");
            if state.epoch != epoch {
                return;
            }
            let Some(entry) = state.entries.peek_mut(key) else {
                return;
            };
            let Some(flight) = entry.flight.take_if(|flight| flight.id == flight_id) else {
                return;
            };

            let now = Instant::now();
            match result {
                Ok(value) => {
                    entry.value = Some(Arc::clone(value));
                    entry.error = None;
                    entry.fetched_at = Some(now);
                    entry.stale_after = if flight.generation == entry.generation {
                        now.checked_add(window)
                    } else {
                        Some(now)
                    };
                    EventKind::Updated
                }
                Err(err) => {
                    entry.value = None;
                    entry.error = Some(err.clone());
                    EventKind::Failed
                }
            }
        };

        match &kind {
            EventKind::Failed => debug!(target: SOURCE, key = %key, "cache load failed"),
            _ => trace!(target: SOURCE, key = %key, "cache load stored"),
        }
        self.subscribers.publish(key, kind);
    }
}

fn downcast<T: Clone + 'static>(key: &CacheKey, value: CachedValue) -> Result<T, ClientError> {
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        ClientError::transport(format!("cached value for `{key}` has an unexpected type"))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;
    use crate::cache::keys::Resource;

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String, ClientError>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value.to_string())
            }
            .boxed()
        }
    }

    fn cart() -> CacheKey {
        CacheKey::singleton(Resource::BuyerCart)
    }

    fn cache_with_stale(seconds: u64) -> QueryCache {
        QueryCache::new(CacheConfig {
            default_stale: Duration::from_secs(seconds),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_loading() {
        let cache = cache_with_stale(60);
        let calls = Arc::new(AtomicUsize::new(0));

        let first: String = cache.read(cart(), counting_loader(&calls, "a")).await.unwrap();
        let second: String = cache.read(cart(), counting_loader(&calls, "b")).await.unwrap();

        assert_eq!(first, "a");
        assert_eq!(second, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&cart()), Some(EntryStatus::Fresh));
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_load() {
        let cache = cache_with_stale(60);
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let loader_calls = Arc::clone(&calls);
        let leader = cache.read(cart(), move || async move {
            loader_calls.fetch_add(1, Ordering::SeqCst);
            let _ = gate.await;
            Ok::<_, ClientError>("shared".to_string())
        });
        let followers: Vec<_> = (0..4)
            .map(|_| cache.read(cart(), counting_loader(&calls, "duplicate")))
            .collect();

        let all = async {
            let (first, rest) = tokio::join!(leader, futures::future::join_all(followers));
            (first, rest)
        };
        let releaser = async {
            tokio::task::yield_now().await;
            let _ = release.send(());
        };
        let ((first, rest), ()) = tokio::join!(all, releaser);

        assert_eq!(first.unwrap(), "shared");
        for result in rest {
            assert_eq!(result.unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_new_load() {
        let cache = cache_with_stale(600);
        let calls = Arc::new(AtomicUsize::new(0));

        let _: String = cache.read(cart(), counting_loader(&calls, "old")).await.unwrap();
        assert!(cache.invalidate(&cart()));
        assert_eq!(cache.status(&cart()), Some(EntryStatus::Stale));

        let value: String = cache.read(cart(), counting_loader(&calls, "new")).await.unwrap();
        assert_eq!(value, "new");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_during_load_triggers_refetch() {
        let cache = cache_with_stale(600);
        let (release, gate) = oneshot::channel::<()>();

        let first = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .read(cart(), move || async move {
                        let _ = gate.await;
                        Ok::<_, ClientError>("before".to_string())
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;
        assert_eq!(cache.status(&cart()), Some(EntryStatus::InFlight));

        cache.invalidate(&cart());
        let calls = Arc::new(AtomicUsize::new(0));
        let second = tokio::spawn({
            let cache = cache.clone();
            let loader = counting_loader(&calls, "after");
            async move { cache.read::<String, _, _>(cart(), loader).await }
        });
        tokio::task::yield_now().await;
        let _ = release.send(());

        assert_eq!(first.await.unwrap().unwrap(), "before");
        assert_eq!(second.await.unwrap().unwrap(), "after");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prefix_invalidation_stops_at_segment_boundary() {
        let cache = cache_with_stale(600);
        let calls = Arc::new(AtomicUsize::new(0));
        let search = CacheKey::new(
            Resource::ProductsSearch,
            &crate::client::QueryParams::new().with("q", "lamp"),
        );
        let product = CacheKey::entity(Resource::Product, "p1");

        let _: String = cache.read(search.clone(), counting_loader(&calls, "s")).await.unwrap();
        let _: String = cache.read(product.clone(), counting_loader(&calls, "p")).await.unwrap();

        assert_eq!(cache.invalidate_prefix("products"), 1);
        assert_eq!(cache.status(&search), Some(EntryStatus::Stale));
        assert_eq!(cache.status(&product), Some(EntryStatus::Fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_go_stale_after_window() {
        let cache = cache_with_stale(30);
        let calls = Arc::new(AtomicUsize::new(0));

        let _: String = cache.read(cart(), counting_loader(&calls, "a")).await.unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.status(&cart()), Some(EntryStatus::Fresh));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.status(&cart()), Some(EntryStatus::Stale));
        let _: String = cache.read(cart(), counting_loader(&calls, "b")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resource_window_overrides_default() {
        let cache = cache_with_stale(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let categories = CacheKey::singleton(Resource::ProductsCategories);

        let _: String = cache
            .read(categories.clone(), counting_loader(&calls, "c"))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        let _: String = cache
            .read(categories.clone(), counting_loader(&calls, "c"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let _: String = cache.read(cart(), counting_loader(&calls, "x")).await.unwrap();
        let _: String = cache.read(cart(), counting_loader(&calls, "x")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let cache = cache_with_stale(600);
        let result: Result<String, _> = cache
            .read(cart(), || async { Err(ClientError::transport("boom")) })
            .await;
        assert!(matches!(result, Err(ClientError::Transport { .. })));
        assert_eq!(cache.status(&cart()), Some(EntryStatus::Error));

        let calls = Arc::new(AtomicUsize::new(0));
        let value: String = cache.read(cart(), counting_loader(&calls, "ok")).await.unwrap();
        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lru_eviction_notifies_subscribers() {
        let cache = QueryCache::new(CacheConfig {
            capacity: 1,
            default_stale: Duration::from_secs(600),
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let _sub = cache.subscribe(cart(), move |event| {
            sink.lock().unwrap().push(event.kind);
        });

        let _: String = cache.read(cart(), counting_loader(&calls, "a")).await.unwrap();
        let me = CacheKey::singleton(Resource::AuthMe);
        let _: String = cache.read(me.clone(), counting_loader(&calls, "b")).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.status(&cart()), None);
        assert_eq!(
            *events.lock().unwrap(),
            vec![EventKind::Updated, EventKind::Evicted]
        );
    }

    #[tokio::test]
    async fn clear_is_not_repopulated_by_older_flight() {
        let cache = cache_with_stale(600);
        let (release, gate) = oneshot::channel::<()>();
        let pending = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .read(cart(), move || async move {
                        let _ = gate.await;
                        Ok::<_, ClientError>("stale session".to_string())
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;

        cache.clear();
        let _ = release.send(());
        assert_eq!(pending.await.unwrap().unwrap(), "stale session");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unsubscribed_callback_is_silent() {
        let cache = cache_with_stale(600);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = cache.subscribe(cart(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        let calls = Arc::new(AtomicUsize::new(0));
        let _: String = cache.read(cart(), counting_loader(&calls, "a")).await.unwrap();
        cache.invalidate(&cart());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
