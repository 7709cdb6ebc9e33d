//! Per-owner memoization of fully paginated fetches.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CancelStage, GraphqlClientError};

/// Load-once cache keyed by owner.
///
/// One lock guards the whole map and is held across the fetch, so fetches
/// through the same cache never overlap, even for different owners. Stored
/// entries are never refreshed or evicted; failed fetches store nothing.
#[derive(Debug)]
pub struct OwnerCache<T> {
    entries: Option<Mutex<HashMap<String, Vec<T>>>>,
}

impl<T: Clone> Default for OwnerCache<T> {
    fn default() -> Self {
        Self::enabled()
    }
}

impl<T: Clone> OwnerCache<T> {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    /// Memoizing cache.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            entries: Some(Mutex::new(HashMap::with_capacity(8))),
        }
    }

    /// Pass-through cache: every call fetches, nothing is serialized.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { entries: None }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Return the stored list for `owner`, or run `fetch` and store its result.
    ///
    /// Cancelling `cancel` abandons the wait for the lock with
    /// [`CancelStage::CacheWait`]. Once the lock is held, cancelling the
    /// fetch is up to `fetch` itself.
    pub async fn get_or_fetch<E, F, Fut>(
        &self,
        owner: &str,
        cancel: &CancellationToken,
        fetch: F,
    ) -> Result<Vec<T>, E>
    where
        E: From<GraphqlClientError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let Some(entries) = &self.entries else {
            return fetch().await;
        };

        let mut guard = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(GraphqlClientError::Cancelled(CancelStage::CacheWait).into());
            }
            guard = entries.lock() => guard,
        };
        if let Some(hit) = guard.get(owner) {
            debug!(owner, items = hit.len(), "owner cache hit");
            return Ok(hit.clone());
        }

        debug!(owner, "owner cache miss");
        let fetched = fetch().await?;
        guard.insert(owner.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// Stored list for `owner`, without fetching.
    pub async fn get(&self, owner: &str) -> Option<Vec<T>> {
        let entries = self.entries.as_ref()?;
        entries.lock().await.get(owner).cloned()
    }

    /// Number of owners with a stored list.
    pub async fn len(&self) -> usize {
        match &self.entries {
            Some(entries) => entries.lock().await.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache = OwnerCache::enabled();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let items = cache
                .get_or_fetch("acme", &CancellationToken::new(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GraphqlClientError>(vec![1, 2, 3])
                })
                .await
                .expect("fetch");
            assert_eq!(items, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("acme").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_stored() {
        let cache: OwnerCache<u32> = OwnerCache::enabled();

        let err = cache
            .get_or_fetch("acme", &CancellationToken::new(), || async {
                Err::<Vec<u32>, _>(GraphqlClientError::Decode("boom".to_string()))
            })
            .await
            .expect_err("fetch fails");
        assert!(matches!(err, GraphqlClientError::Decode(message) if message == "boom"));
        assert!(cache.is_empty().await);

        let items = cache
            .get_or_fetch("acme", &CancellationToken::new(), || async { Ok::<_, GraphqlClientError>(vec![7]) })
            .await
            .expect("retry fetches again");
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let cache = OwnerCache::disabled();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_fetch("acme", &CancellationToken::new(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GraphqlClientError>(vec![1])
                })
                .await
                .expect("fetch");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.get("acme").await, None);
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn owners_are_cached_separately() {
        let cache = OwnerCache::enabled();
        let a = cache
            .get_or_fetch("a", &CancellationToken::new(), || async { Ok::<_, GraphqlClientError>(vec!["a1"]) })
            .await
            .expect("a");
        let b = cache
            .get_or_fetch("b", &CancellationToken::new(), || async { Ok::<_, GraphqlClientError>(vec!["b1", "b2"]) })
            .await
            .expect("b");

        assert_eq!(a, vec!["a1"]);
        assert_eq!(b, vec!["b1", "b2"]);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_fetches_never_overlap() {
        let cache = Arc::new(OwnerCache::enabled());
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            let calls = Arc::clone(&calls);
            let owner = format!("owner-{}", i % 4);
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&owner, &CancellationToken::new(), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, GraphqlClientError>(vec![owner.clone()])
                    })
                    .await
            }));
        }

        for task in tasks {
            task.await.expect("join").expect("fetch");
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.len().await, 4);
    }

    #[tokio::test]
    async fn cancelled_caller_stops_waiting_for_the_lock() {
        let cache = Arc::new(OwnerCache::enabled());
        let release = CancellationToken::new();

        let holder = {
            let cache = Arc::clone(&cache);
            let release = release.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("slow", &CancellationToken::new(), || async {
                        release.cancelled().await;
                        Ok::<_, GraphqlClientError>(vec![1_u32])
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let cancel = CancellationToken::new();
        let waiter = {
            let cache = Arc::clone(&cache);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("other", &cancel, || async {
                        Ok::<_, GraphqlClientError>(vec![2_u32])
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let err = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter returns while the lock is held")
            .expect("join")
            .expect_err("cancelled");
        assert!(matches!(
            err,
            GraphqlClientError::Cancelled(CancelStage::CacheWait)
        ));

        release.cancel();
        assert_eq!(holder.await.expect("join").expect("fetch"), vec![1]);
        assert_eq!(cache.get("other").await, None);
    }
}
