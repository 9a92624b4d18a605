// ── Per-key fetch control ──
//
// One `Slot` per resource key. Its `watch` channel carries the entry
// snapshot to subscribers; its control mutex serializes every decision
// about starting, coalescing, and applying fetches.
//
// Lock order: map shard (when held) before `control`. Nothing takes a
// map lock while holding `control`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::entry::{CacheEntry, ResourceKey};
use crate::error::CoreError;

pub(crate) type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, CoreError>> + Send + Sync>;

/// What caused a fetch to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchOrigin {
    Subscribe,
    Tick,
    Invalidation,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LiveFetch {
    pub seq: u64,
    pub origin: FetchOrigin,
}

pub(crate) struct FetchControl<T> {
    pub fetcher: Fetcher<T>,
    pub subscribers: usize,
    /// Start-order sequence of the most recently started fetch.
    pub next_seq: u64,
    /// Sequence of the result currently reflected in the entry. Results
    /// at or below it are stale.
    pub applied_seq: u64,
    /// The most recently started fetch, while it is outstanding.
    pub live: Option<LiveFetch>,
    /// The live request can no longer satisfy what was asked of it; one
    /// follow-up fetch starts when it settles.
    pub dirty: bool,
    /// Cancels the background refresh task; present while subscribed.
    pub poll: Option<CancellationToken>,
    /// Bumped on every subscriber change; an eviction timer only fires
    /// if the generation it captured is still current.
    pub eviction_gen: u64,
}

pub(crate) struct Slot<T> {
    pub key: ResourceKey,
    pub state: watch::Sender<CacheEntry<T>>,
    control: Mutex<FetchControl<T>>,
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("key", &self.key).finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Slot<T> {
    pub fn new(key: ResourceKey, fetcher: Fetcher<T>) -> Self {
        let (state, _) = watch::channel(CacheEntry::pending(key.clone()));
        Self {
            key,
            state,
            control: Mutex::new(FetchControl {
                fetcher,
                subscribers: 0,
                next_seq: 0,
                applied_seq: 0,
                live: None,
                dirty: false,
                poll: None,
                eviction_gen: 0,
            }),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, FetchControl<T>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CacheEntry<T> {
        self.state.borrow().clone()
    }

    /// Request a fetch. Returns whether a new request was started.
    ///
    /// A trigger while a request is outstanding is coalesced into it,
    /// except that an invalidation supersedes an outstanding request
    /// that was not itself started by an invalidation. An invalidation
    /// that is coalesced marks the slot dirty, so exactly one more
    /// request follows once the outstanding one settles.
    pub fn trigger(self: &Arc<Self>, origin: FetchOrigin) -> bool {
        let mut ctl = self.lock();
        if ctl.subscribers == 0 {
            debug!(key = %self.key, ?origin, "no subscribers, fetch skipped");
            return false;
        }
        let live = ctl.live;
        match live {
            None => {}
            // A request disowned by a purge is never superseded; it is
            // followed up instead.
            Some(live)
                if origin == FetchOrigin::Invalidation
                    && live.origin != FetchOrigin::Invalidation
                    && live.seq > ctl.applied_seq =>
            {
                debug!(key = %self.key, superseded = live.seq, "invalidation supersedes in-flight fetch");
            }
            Some(live) => {
                if origin == FetchOrigin::Invalidation {
                    ctl.dirty = true;
                }
                debug!(key = %self.key, ?origin, in_flight = live.seq, dirty = ctl.dirty, "fetch coalesced");
                return false;
            }
        }
        self.start_fetch(&mut ctl, origin);
        true
    }

    /// Start a request unconditionally. Caller holds `control`.
    pub fn start_fetch(self: &Arc<Self>, ctl: &mut FetchControl<T>, origin: FetchOrigin) {
        ctl.next_seq += 1;
        let seq = ctl.next_seq;
        ctl.live = Some(LiveFetch { seq, origin });
        ctl.dirty = false;
        self.state.send_if_modified(|entry| !std::mem::replace(&mut entry.is_fetching, true));

        debug!(key = %self.key, seq, ?origin, "fetch started");
        let request = (ctl.fetcher)();
        let slot = Arc::clone(self);
        tokio::spawn(async move {
            let result = request.await;
            slot.finish(seq, result);
        });
    }

    fn finish(self: &Arc<Self>, seq: u64, result: Result<Vec<T>, CoreError>) {
        let mut ctl = self.lock();
        if ctl.live.is_some_and(|live| live.seq == seq) {
            ctl.live = None;
            if ctl.dirty && ctl.subscribers > 0 {
                debug!(key = %self.key, after = seq, "starting follow-up fetch");
                self.start_fetch(&mut ctl, FetchOrigin::Invalidation);
            }
            ctl.dirty = false;
        }
        let fetching = ctl.live.is_some();

        if seq <= ctl.applied_seq {
            debug!(key = %self.key, seq, applied = ctl.applied_seq, "stale fetch result discarded");
        } else if ctl.subscribers == 0 {
            debug!(key = %self.key, seq, "fetch result discarded, no subscribers");
        } else {
            ctl.applied_seq = seq;
            match &result {
                Ok(items) => debug!(key = %self.key, seq, count = items.len(), "fetch applied"),
                Err(e) => warn!(key = %self.key, seq, error = %e, "fetch failed"),
            }
            self.state.send_modify(|entry| {
                entry.apply(result);
                entry.is_fetching = fetching;
            });
            return;
        }

        self.state.send_if_modified(|entry| {
            let changed = entry.is_fetching != fetching;
            entry.is_fetching = fetching;
            changed
        });
    }

    /// Drop cached data and disown every outstanding request.
    ///
    /// A disowned request stays live, so nothing else starts alongside
    /// it; its result is discarded and a follow-up fetch replaces it.
    pub fn reset(&self) {
        let mut ctl = self.lock();
        ctl.applied_seq = ctl.next_seq;
        ctl.dirty = ctl.live.is_some();
        let mut entry = CacheEntry::pending(self.key.clone());
        entry.is_fetching = ctl.live.is_some();
        self.state.send_replace(entry);
    }

    /// Whether an eviction timer armed at `generation` may remove this slot.
    pub fn is_idle_since(&self, generation: u64) -> bool {
        let ctl = self.lock();
        ctl.subscribers == 0 && ctl.eviction_gen == generation
    }
}
