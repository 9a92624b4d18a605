// ── Keyed resource cache ──
//
// Shared, de-duplicated fetching of list-shaped server resources.
// Each key has at most one live request; background refresh runs while
// the key has subscribers; results are applied in request start order,
// never completion order.

mod entry;
mod refresh;
mod slot;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use entry::{CacheEntry, EntryStatus, ResourceKey};
pub(crate) use slot::Slot;

use self::slot::{FetchOrigin, Fetcher};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::stream::Subscription;

/// Process-wide keyed cache of server collections.
///
/// Cheaply cloneable. All methods that may start a fetch must be called
/// from within a Tokio runtime.
pub struct ResourceCache<T: Clone + Send + Sync + 'static> {
    inner: Arc<CacheInner<T>>,
}

pub(crate) struct CacheInner<T> {
    pub(crate) slots: DashMap<ResourceKey, Arc<Slot<T>>>,
    refresh_interval: Duration,
    idle_eviction: Duration,
    cancel: CancellationToken,
}

impl<T> Drop for CacheInner<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T: Clone + Send + Sync + 'static> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ResourceCache<T> {
    /// A zero `refresh_interval` disables background refresh.
    pub fn new(refresh_interval: Duration, idle_eviction: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: DashMap::new(),
                refresh_interval,
                idle_eviction,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.refresh_interval, config.idle_eviction)
    }

    /// Register interest in `key`.
    ///
    /// Creates the entry in `Pending` if needed and starts a fetch unless
    /// one is already outstanding. `fetcher` replaces any fetcher a
    /// previous subscriber supplied for the same key.
    pub fn subscribe<F, Fut>(&self, key: ResourceKey, fetcher: F) -> Subscription<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, CoreError>> + Send + 'static,
    {
        let boxed: Fetcher<T> = Arc::new(move || fetcher().boxed());

        let guard = self.inner.slots.entry(key.clone()).or_insert_with(|| {
            debug!(%key, "cache entry created");
            Arc::new(Slot::new(key.clone(), Arc::clone(&boxed)))
        });
        let slot = Arc::clone(guard.value());
        {
            let mut ctl = slot.lock();
            ctl.fetcher = boxed;
            ctl.subscribers += 1;
            ctl.eviction_gen += 1;
            if ctl.subscribers == 1 {
                ctl.poll = self.spawn_poll(&slot);
            }
            if ctl.live.is_none() {
                slot.start_fetch(&mut ctl, FetchOrigin::Subscribe);
            }
        }
        drop(guard);

        Subscription::new(self.clone(), slot)
    }

    /// Force an immediate refetch of `key`.
    ///
    /// Coalesced with an outstanding invalidation-triggered request,
    /// which is then followed by exactly one more fetch. A key without
    /// subscribers is left alone: nothing would observe the
    /// result, and the next subscription fetches anyway.
    pub fn invalidate(&self, key: &ResourceKey) {
        let Some(slot) = self.slot(key) else {
            debug!(%key, "invalidate on unknown key ignored");
            return;
        };
        slot.trigger(FetchOrigin::Invalidation);
    }

    /// Forget the data cached for `key`.
    ///
    /// Unsubscribed entries are removed outright; subscribed ones fall
    /// back to `Pending` and pick up fresh data on the next fetch.
    /// Results of requests already in flight are discarded.
    pub fn purge(&self, key: &ResourceKey) {
        let removed = self
            .inner
            .slots
            .remove_if(key, |_, slot| slot.lock().subscribers == 0);
        if let Some((_, slot)) = removed {
            slot.reset();
            debug!(%key, "cache entry purged");
            return;
        }
        if let Some(slot) = self.slot(key) {
            slot.reset();
            debug!(%key, "cache entry reset");
        }
    }

    /// Current snapshot for `key`, if an entry exists.
    pub fn entry(&self, key: &ResourceKey) -> Option<CacheEntry<T>> {
        self.slot(key).map(|slot| slot.snapshot())
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    /// Stop every background task. Subscriptions stay readable, but no
    /// further refresh or eviction happens.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Internals ────────────────────────────────────────────────────

    fn slot(&self, key: &ResourceKey) -> Option<Arc<Slot<T>>> {
        self.inner.slots.get(key).map(|guard| Arc::clone(guard.value()))
    }

    fn spawn_poll(&self, slot: &Arc<Slot<T>>) -> Option<CancellationToken> {
        if self.inner.refresh_interval.is_zero() {
            return None;
        }
        let token = self.inner.cancel.child_token();
        tokio::spawn(refresh::poll_task(
            Arc::downgrade(slot),
            self.inner.refresh_interval,
            token.clone(),
        ));
        Some(token)
    }

    /// Detach one subscriber. The last one out stops background refresh
    /// and arms the idle-eviction timer.
    pub(crate) fn release(&self, slot: &Arc<Slot<T>>) {
        let generation = {
            let mut ctl = slot.lock();
            ctl.subscribers = ctl.subscribers.saturating_sub(1);
            ctl.eviction_gen += 1;
            if ctl.subscribers > 0 {
                return;
            }
            if let Some(poll) = ctl.poll.take() {
                poll.cancel();
            }
            ctl.eviction_gen
        };
        debug!(key = %slot.key, "last subscriber left");

        // Dropped outside a runtime: the entry lingers until the next
        // subscription or until the cache itself goes away.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        handle.spawn(refresh::eviction_task(
            Arc::downgrade(&self.inner),
            Arc::downgrade(slot),
            generation,
            self.inner.idle_eviction,
            self.inner.cancel.clone(),
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{GatedFetcher, settle};
    use pretty_assertions::assert_eq;

    const TICK: Duration = Duration::from_secs(30);
    const IDLE: Duration = Duration::from_secs(300);

    fn cache() -> ResourceCache<u32> {
        ResourceCache::new(TICK, IDLE)
    }

    fn key() -> ResourceKey {
        ResourceKey::user_urls()
    }

    fn subscribe(cache: &ResourceCache<u32>, fetcher: &GatedFetcher<u32>) -> Subscription<u32> {
        let fetcher = fetcher.clone();
        cache.subscribe(key(), move || fetcher.fetch())
    }

    #[tokio::test(start_paused = true)]
    async fn first_subscription_starts_pending_and_fetches() {
        let cache = cache();
        let fetcher = GatedFetcher::new();

        let sub = subscribe(&cache, &fetcher);
        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(entry.is_fetching);
        assert!(entry.data.is_none());
        assert_eq!(fetcher.calls(), 1);

        fetcher.resolve_next(Ok(vec![7, 8]));
        settle().await;

        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Fresh);
        assert_eq!(entry.items(), &[7, 8]);
        assert!(entry.last_fetched_at.is_some());
        assert!(!entry.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_listing_is_fresh_not_pending() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);

        fetcher.resolve_next(Ok(Vec::new()));
        settle().await;

        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Fresh);
        assert_eq!(entry.data.as_deref(), Some(&Vec::new()));
        assert!(entry.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_subscribers_share_one_request() {
        let cache = cache();
        let fetcher = GatedFetcher::new();

        let _a = subscribe(&cache, &fetcher);
        let _b = subscribe(&cache, &fetcher);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_subscription_refetches_settled_entry() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let _a = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        let _b = subscribe(&cache, &fetcher);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn double_invalidate_starts_one_request() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let _sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        cache.invalidate(&key());
        cache.invalidate(&key());
        settle().await;

        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_invalidation_refetches_once_afterwards() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(Vec::new()));
        settle().await;

        cache.invalidate(&key());
        cache.invalidate(&key());
        cache.invalidate(&key());
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        // The first invalidation's request predates the later ones.
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.items(), &[1]);
        assert!(entry.is_fetching);
        assert_eq!(fetcher.calls(), 3);

        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.items(), &[1, 2]);
        assert!(!entry.is_fetching);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn background_refresh_runs_every_interval() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        settle().await;
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        tokio::time::advance(TICK).await;
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;
        assert_eq!(sub.latest().items(), &[1, 2]);

        tokio::time::advance(TICK).await;
        settle().await;
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_is_coalesced_with_in_flight_request() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let _sub = subscribe(&cache, &fetcher);
        settle().await;

        // Initial request never resolves before the tick.
        tokio::time::advance(TICK).await;
        settle().await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn later_started_request_wins_over_slower_earlier_one() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        settle().await;
        fetcher.resolve_next(Ok(vec![0]));
        settle().await;

        // Background tick starts request A.
        tokio::time::advance(TICK).await;
        settle().await;
        let tick_request = fetcher.take_next();

        // Invalidation 10ms later starts request B.
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.invalidate(&key());
        settle().await;
        assert_eq!(fetcher.calls(), 3);

        // B resolves first, then A.
        fetcher.resolve_next(Ok(vec![2]));
        settle().await;
        tick_request.send(Ok(vec![1])).unwrap();
        settle().await;

        let entry = sub.latest();
        assert_eq!(entry.items(), &[2]);
        assert!(!entry.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_request_resolving_first_is_still_applied() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        settle().await;
        fetcher.resolve_next(Ok(vec![0]));
        settle().await;

        tokio::time::advance(TICK).await;
        settle().await;
        cache.invalidate(&key());
        settle().await;

        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.items(), &[1]);
        assert!(entry.is_fetching);

        fetcher.resolve_next(Ok(vec![2]));
        settle().await;
        assert_eq!(sub.latest().items(), &[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_stale_data_visible() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![4]));
        settle().await;

        cache.invalidate(&key());
        fetcher.resolve_next(Err(CoreError::Api {
            message: "Could not reach the server".into(),
            status: None,
        }));
        settle().await;

        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Error);
        assert_eq!(entry.items(), &[4]);
        assert_eq!(
            entry.error.as_ref().map(CoreError::display_message),
            Some("Could not reach the server")
        );
        // No immediate retry.
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn result_after_last_unsubscribe_is_discarded() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        sub.unsubscribe();

        fetcher.resolve_next(Ok(vec![9]));
        settle().await;

        let entry = cache.entry(&key()).unwrap();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(entry.data.is_none());
        assert!(!entry.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_stops_without_subscribers() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        settle().await;
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        drop(sub);

        tokio::time::advance(TICK * 3).await;
        settle().await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_without_subscribers_does_nothing() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        drop(subscribe(&cache, &fetcher));

        cache.invalidate(&key());
        cache.invalidate(&ResourceKey::new("unknown"));
        settle().await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_entry_is_evicted_and_recreated() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        drop(sub);
        settle().await;

        tokio::time::advance(IDLE).await;
        settle().await;
        assert!(cache.entry(&key()).is_none());
        assert!(cache.is_empty());

        let sub = subscribe(&cache, &fetcher);
        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(entry.data.is_none());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribing_within_grace_period_keeps_entry() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        drop(sub);
        settle().await;

        tokio::time::advance(IDLE / 2).await;
        let sub = subscribe(&cache, &fetcher);
        tokio::time::advance(IDLE).await;
        settle().await;

        let entry = cache.entry(&key()).unwrap();
        assert_eq!(entry.items(), &[1]);
        assert_eq!(sub.latest().status, EntryStatus::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_data_and_in_flight_results() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        cache.invalidate(&key());
        cache.purge(&key());
        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;

        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(entry.data.is_none());
        assert!(entry.last_fetched_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_waits_for_disowned_request_before_refetching() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        cache.invalidate(&key());
        cache.purge(&key());
        assert!(sub.latest().is_fetching);

        cache.invalidate(&key());
        tokio::time::advance(TICK).await;
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(entry.data.is_none());
        assert!(entry.is_fetching);
        assert_eq!(fetcher.calls(), 3);

        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.status, EntryStatus::Fresh);
        assert_eq!(entry.items(), &[1, 2]);
        assert!(!entry.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_after_purge_does_not_race_disowned_request() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        let sub = subscribe(&cache, &fetcher);

        cache.purge(&key());
        cache.invalidate(&key());
        settle().await;
        assert_eq!(fetcher.calls(), 1);

        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        assert_eq!(fetcher.calls(), 2);
        assert!(sub.latest().data.is_none());

        fetcher.resolve_next(Ok(vec![2]));
        settle().await;
        assert_eq!(sub.latest().items(), &[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_unsubscribed_entry() {
        let cache = cache();
        let fetcher = GatedFetcher::new();
        drop(subscribe(&cache, &fetcher));

        cache.purge(&key());
        assert!(cache.entry(&key()).is_none());
    }
}
