//! Typed, cached access to blogs and projects
//!
//! [`Portfolio`] binds the resource fetchers to fixed cache keys and parses
//! the unwrapped payloads into records. Background refreshes started by cache
//! hits are collected so a short-lived process can wait for them before exit.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::{unwrap_data, Blog, Project};
use crate::api::{ApiClient, ApiError, Endpoint};
use crate::refresh::{CachedFetcher, Revalidation};

/// Cache key for the blog list
pub const BLOGS_KEY: &str = "blogs";
/// Cache key for the project list
pub const PROJECTS_KEY: &str = "projects";
/// Cache key for featured projects
pub const FEATURED_PROJECTS_KEY: &str = "featured_projects";

/// Cache key for one blog post
pub fn blog_key(slug: &str) -> String {
    format!("blog_{}", slug)
}

/// Errors that can occur when loading portfolio records
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Request failed after all retries
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Payload did not match the expected record shape
    #[error("Unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// A loaded value and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    /// Served from cache while a refresh runs in the background
    pub from_cache: bool,
}

/// Blog and project loader
pub struct Portfolio {
    client: ApiClient,
    fetcher: Option<CachedFetcher>,
    pending: Mutex<Vec<Revalidation>>,
}

impl Portfolio {
    /// Loader that caches through `fetcher`
    pub fn new(client: ApiClient, fetcher: CachedFetcher) -> Self {
        Self {
            client,
            fetcher: Some(fetcher),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Loader that always goes to the network
    pub fn uncached(client: ApiClient) -> Self {
        Self {
            client,
            fetcher: None,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn blogs(&self) -> Result<Loaded<Vec<Blog>>, PortfolioError> {
        self.load(BLOGS_KEY, Endpoint::blogs()).await
    }

    pub async fn blog(&self, slug: &str) -> Result<Loaded<Blog>, PortfolioError> {
        self.load(&blog_key(slug), Endpoint::blog(slug)).await
    }

    pub async fn projects(&self) -> Result<Loaded<Vec<Project>>, PortfolioError> {
        self.load(PROJECTS_KEY, Endpoint::projects()).await
    }

    pub async fn featured_projects(&self) -> Result<Loaded<Vec<Project>>, PortfolioError> {
        self.load(FEATURED_PROJECTS_KEY, Endpoint::featured_projects())
            .await
    }

    /// Number of background refreshes not yet awaited
    pub fn pending_revalidations(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Waits for every background refresh started so far
    pub async fn settle(&self) {
        let pending: Vec<Revalidation> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => {
                warn!("revalidation list poisoned, not waiting");
                return;
            }
        };
        futures::future::join_all(pending.into_iter().map(Revalidation::wait)).await;
    }

    async fn load<T: DeserializeOwned>(
        &self,
        key: &str,
        endpoint: Endpoint,
    ) -> Result<Loaded<T>, PortfolioError> {
        let raw = self.load_raw(key, endpoint).await?;
        Ok(Loaded {
            value: serde_json::from_value(unwrap_data(raw.value))?,
            from_cache: raw.from_cache,
        })
    }

    async fn load_raw(&self, key: &str, endpoint: Endpoint) -> Result<Loaded<Value>, ApiError> {
        let client = self.client.clone();
        let fetch_fn = move || async move { client.fetch_endpoint(&endpoint).await };

        let Some(fetcher) = &self.fetcher else {
            let value = fetch_fn().await?;
            return Ok(Loaded {
                value,
                from_cache: false,
            });
        };

        let mut fetch = fetcher.fetch_with_cache(key, fetch_fn).await;
        if let Some(revalidation) = fetch.take_revalidation() {
            match self.pending.lock() {
                Ok(mut pending) => {
                    pending.retain(|r| !r.is_finished());
                    pending.push(revalidation);
                }
                Err(_) => warn!(key, "revalidation list poisoned, detaching refresh"),
            }
        }

        Ok(Loaded {
            value: fetch.result?,
            from_cache: fetch.from_cache,
        })
    }
}
