// ── Background refresh & eviction tasks ──
//
// Both tasks hold only weak references: they never keep a slot or the
// cache alive on their own.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::CacheInner;
use super::slot::{FetchOrigin, Slot};

/// Re-trigger the slot's fetcher every `period` until cancelled.
pub(super) async fn poll_task<T: Clone + Send + Sync + 'static>(
    slot: Weak<Slot<T>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(slot) = slot.upgrade() else { break };
                slot.trigger(FetchOrigin::Tick);
            }
        }
    }
}

/// Remove the slot after `delay` unless it was re-subscribed meanwhile.
pub(super) async fn eviction_task<T: Clone + Send + Sync + 'static>(
    cache: Weak<CacheInner<T>>,
    slot: Weak<Slot<T>>,
    generation: u64,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(delay) => {
            let (Some(cache), Some(slot)) = (cache.upgrade(), slot.upgrade()) else {
                return;
            };
            let evicted = cache.slots.remove_if(&slot.key, |_, current| {
                std::sync::Arc::ptr_eq(current, &slot) && current.is_idle_since(generation)
            });
            if evicted.is_some() {
                debug!(key = %slot.key, "idle cache entry evicted");
            }
        }
    }
}
