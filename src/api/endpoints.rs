//! Named endpoints of the portfolio API
//!
//! Each fetcher is a plain binding of [`ApiClient::fetch_api`] to a fixed
//! [`Endpoint`]. Slugs are interpolated as given; encode them first with
//! [`encode_slug`] if they may contain reserved characters.

use std::borrow::Cow;

use serde_json::Value;

use super::client::{ApiClient, ApiResult, Method, RequestOptions};

/// Immutable description of a request target
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub path: Cow<'static, str>,
    pub method: Method,
    pub body: Option<Value>,
}

impl Endpoint {
    fn get(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            method: Method::GET,
            body: None,
        }
    }

    /// `GET /blogs`
    pub fn blogs() -> Self {
        Self::get("/blogs")
    }

    /// `GET /blogs/:slug`
    pub fn blog(slug: &str) -> Self {
        Self {
            path: Cow::Owned(format!("/blogs/{}", slug)),
            method: Method::GET,
            body: None,
        }
    }

    /// `GET /projects`
    pub fn projects() -> Self {
        Self::get("/projects")
    }

    /// `GET /projects/featured`
    pub fn featured_projects() -> Self {
        Self::get("/projects/featured")
    }

    /// Request options matching this descriptor.
    pub fn options(&self) -> RequestOptions {
        let options = RequestOptions::with_method(self.method.clone());
        match &self.body {
            Some(body) => options.with_body(body.clone()),
            None => options,
        }
    }
}

/// Percent-encodes a slug so it is safe as a single path segment.
pub fn encode_slug(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

impl ApiClient {
    /// Fetch a descriptor with the client's retry policy
    pub async fn fetch_endpoint(&self, endpoint: &Endpoint) -> ApiResult {
        self.fetch_api(&endpoint.path, &endpoint.options()).await
    }

    pub async fn fetch_blogs(&self) -> ApiResult {
        self.fetch_endpoint(&Endpoint::blogs()).await
    }

    pub async fn fetch_blog_by_slug(&self, slug: &str) -> ApiResult {
        self.fetch_endpoint(&Endpoint::blog(slug)).await
    }

    pub async fn fetch_projects(&self) -> ApiResult {
        self.fetch_endpoint(&Endpoint::projects()).await
    }

    pub async fn fetch_featured_projects(&self) -> ApiResult {
        self.fetch_endpoint(&Endpoint::featured_projects()).await
    }
}
