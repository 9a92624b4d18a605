// ── Mutation coordination ──
//
// Runs a state-changing server call and keeps the cache honest
// afterward: invalidate on success, hands off on failure. Nothing is
// ever inserted into the cache optimistically.

use std::future::Future;

use tracing::debug;

use crate::cache::{ResourceCache, ResourceKey};
use crate::error::CoreError;

/// Wraps writes that affect cached collections of `T`.
pub struct MutationCoordinator<T: Clone + Send + Sync + 'static> {
    cache: ResourceCache<T>,
}

impl<T: Clone + Send + Sync + 'static> MutationCoordinator<T> {
    pub fn new(cache: ResourceCache<T>) -> Self {
        Self { cache }
    }

    /// Await `operation`; on success invalidate `affected` and return the
    /// operation's own result without waiting for the refetch.
    ///
    /// Failures come back as [`CoreError::Mutation`] with the server
    /// message intact, and the cache is not touched.
    pub async fn mutate<R, Fut>(&self, operation: Fut, affected: &ResourceKey) -> Result<R, CoreError>
    where
        R: Send,
        Fut: Future<Output = Result<R, CoreError>> + Send,
    {
        match operation.await {
            Ok(result) => {
                debug!(key = %affected, "mutation succeeded, invalidating");
                self.cache.invalidate(affected);
                Ok(result)
            }
            Err(e) => {
                debug!(key = %affected, error = %e, "mutation rejected");
                Err(e.into_mutation())
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Clone for MutationCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::EntryStatus;
    use crate::testing::{GatedFetcher, settle};

    fn setup() -> (ResourceCache<u32>, MutationCoordinator<u32>, GatedFetcher<u32>) {
        let cache = ResourceCache::new(Duration::from_secs(30), Duration::from_secs(300));
        let coordinator = MutationCoordinator::new(cache.clone());
        (cache, coordinator, GatedFetcher::new())
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_result_and_invalidates() {
        let (cache, coordinator, fetcher) = setup();
        let f = fetcher.clone();
        let sub = cache.subscribe(ResourceKey::user_urls(), move || f.fetch());
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;

        let created = coordinator
            .mutate(async { Ok::<_, CoreError>("demo") }, &ResourceKey::user_urls())
            .await
            .unwrap();

        // Returned before the refetch resolves.
        assert_eq!(created, "demo");
        assert_eq!(fetcher.calls(), 2);
        assert!(sub.latest().is_fetching);

        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;
        assert_eq!(sub.latest().items(), &[1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_mutations_end_with_a_listing_after_both() {
        let (cache, coordinator, fetcher) = setup();
        let f = fetcher.clone();
        let sub = cache.subscribe(ResourceKey::user_urls(), move || f.fetch());
        fetcher.resolve_next(Ok(Vec::new()));
        settle().await;

        for n in [1, 2] {
            coordinator
                .mutate(async move { Ok::<_, CoreError>(n) }, &ResourceKey::user_urls())
                .await
                .unwrap();
        }
        assert_eq!(fetcher.calls(), 2);

        // The listing requested after the first mutation misses the second.
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        assert_eq!(fetcher.calls(), 3);

        fetcher.resolve_next(Ok(vec![1, 2]));
        settle().await;
        let entry = sub.latest();
        assert_eq!(entry.items(), &[1, 2]);
        assert!(!entry.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_leaves_entry_untouched() {
        let (cache, coordinator, fetcher) = setup();
        let f = fetcher.clone();
        let _sub = cache.subscribe(ResourceKey::user_urls(), move || f.fetch());
        fetcher.resolve_next(Ok(vec![1]));
        settle().await;
        let before = cache.entry(&ResourceKey::user_urls()).unwrap();

        let err = coordinator
            .mutate(
                async {
                    Err::<String, _>(CoreError::Api {
                        message: "slug already taken".into(),
                        status: Some(409),
                    })
                },
                &ResourceKey::user_urls(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::Mutation {
                message: "slug already taken".into(),
                status: Some(409),
            }
        );
        settle().await;
        let after = cache.entry(&ResourceKey::user_urls()).unwrap();
        assert_eq!(after.status, EntryStatus::Fresh);
        assert_eq!(after.data, before.data);
        assert_eq!(after.last_fetched_at, before.last_fetched_at);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_without_subscribers_is_harmless() {
        let (cache, coordinator, _fetcher) = setup();

        let n = coordinator
            .mutate(async { Ok::<_, CoreError>(5) }, &ResourceKey::user_urls())
            .await
            .unwrap();

        assert_eq!(n, 5);
        assert!(cache.entry(&ResourceKey::user_urls()).is_none());
    }
}
