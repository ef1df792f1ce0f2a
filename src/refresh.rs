//! Stale-while-revalidate fetching
//!
//! [`CachedFetcher::fetch_with_cache`] answers from the cache when it can and
//! refreshes the entry on a detached tokio task. Without a valid entry it
//! awaits the fetch and stores a successful result before returning.
//!
//! Concurrent calls for the same key are not coordinated; each hit spawns its
//! own revalidation and the last write wins.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiResult;
use crate::cache::CacheProvider;

/// Outcome of [`CachedFetcher::fetch_with_cache`]
#[derive(Debug)]
pub struct CachedFetch {
    /// Cached data on a hit, otherwise whatever the fetch returned
    pub result: ApiResult,
    /// Whether `result` came from the cache
    pub from_cache: bool,
    revalidation: Option<Revalidation>,
}

/// Handle to a detached background refresh
///
/// Dropping it leaves the refresh running.
#[derive(Debug)]
pub struct Revalidation(JoinHandle<()>);

impl Revalidation {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    /// Waits for the refresh to finish; a panicked task is only logged.
    pub async fn wait(self) {
        if let Err(e) = self.0.await {
            warn!(error = %e, "background revalidation task aborted");
        }
    }
}

impl CachedFetch {
    /// Whether a background refresh was started for this call
    pub fn is_revalidating(&self) -> bool {
        self.revalidation.is_some()
    }

    /// Detaches the background refresh so it can be awaited elsewhere
    pub fn take_revalidation(&mut self) -> Option<Revalidation> {
        self.revalidation.take()
    }

    /// Waits for the background refresh, if any, to finish
    ///
    /// Never changes `result`.
    pub async fn settle(&mut self) {
        if let Some(revalidation) = self.revalidation.take() {
            revalidation.wait().await;
        }
    }
}

/// Orchestrates cache lookups and fetches for one cache provider
#[derive(Clone)]
pub struct CachedFetcher {
    cache: Arc<dyn CacheProvider>,
}

impl CachedFetcher {
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn CacheProvider> {
        &self.cache
    }

    /// Return cached data for `key` if valid, refreshing it in the background
    ///
    /// # Arguments
    /// * `key` - Logical cache key (without prefix)
    /// * `fetch_fn` - Produces a fresh result; called exactly once, either
    ///   awaited here on a miss or on a spawned task on a hit
    ///
    /// Must be called from within a tokio runtime.
    pub async fn fetch_with_cache<F, Fut>(&self, key: &str, fetch_fn: F) -> CachedFetch
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult> + Send + 'static,
    {
        if let Some(cached) = self.cache.get(key) {
            debug!(key, "serving cached data, revalidating in background");
            let revalidation = self.spawn_revalidation(key.to_string(), fetch_fn);
            return CachedFetch {
                result: Ok(cached),
                from_cache: true,
                revalidation: Some(revalidation),
            };
        }

        debug!(key, "cache miss, fetching");
        let result = fetch_fn().await;
        if let Ok(data) = &result {
            self.cache.set(key, data);
        }

        CachedFetch {
            result,
            from_cache: false,
            revalidation: None,
        }
    }

    fn spawn_revalidation<F, Fut>(&self, key: String, fetch_fn: F) -> Revalidation
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        Revalidation(tokio::spawn(async move {
            match fetch_fn().await {
                Ok(fresh) => {
                    cache.set(&key, &fresh);
                    debug!(key = %key, "background revalidation stored fresh data");
                }
                Err(e) => warn!(key = %key, error = %e, "background revalidation failed"),
            }
        }))
    }
}
