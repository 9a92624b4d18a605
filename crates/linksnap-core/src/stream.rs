// ── Reactive cache subscriptions ──
//
// A `Subscription` is both a read handle on one cache entry and the
// registration that keeps the entry refreshing. Dropping it unsubscribes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::cache::{CacheEntry, ResourceCache, ResourceKey, Slot};

/// Live view of one cache entry.
///
/// Provides point-in-time snapshots and change notification via
/// `changed()` or by converting into a `Stream`.
pub struct Subscription<T: Clone + Send + Sync + 'static> {
    cache: ResourceCache<T>,
    slot: Arc<Slot<T>>,
    receiver: watch::Receiver<CacheEntry<T>>,
    current: CacheEntry<T>,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(cache: ResourceCache<T>, slot: Arc<Slot<T>>) -> Self {
        let mut receiver = slot.state.subscribe();
        let current = receiver.borrow_and_update().clone();
        Self {
            cache,
            slot,
            receiver,
            current,
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.slot.key
    }

    /// The snapshot seen at creation or at the last `changed()`.
    pub fn current(&self) -> &CacheEntry<T> {
        &self.current
    }

    /// The entry as it is right now.
    pub fn latest(&self) -> CacheEntry<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the entry's sender is gone.
    pub async fn changed(&mut self) -> Option<CacheEntry<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` that yields the current snapshot first,
    /// then every change. The stream keeps the subscription alive.
    pub fn into_stream(self) -> SubscriptionStream<T> {
        SubscriptionStream {
            inner: WatchStream::new(self.receiver.clone()),
            _subscription: self,
        }
    }

    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cache.release(&self.slot);
    }
}

/// `Stream` adapter over a [`Subscription`].
pub struct SubscriptionStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<CacheEntry<T>>,
    _subscription: Subscription<T>,
}

impl<T: Clone + Send + Sync + 'static> Stream for SubscriptionStream<T> {
    type Item = CacheEntry<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
