//! Portfolio API access
//!
//! [`ApiClient`] issues requests against the versioned base URL with bounded
//! exponential-backoff retries; [`endpoints`] binds it to the blog and project
//! resources.

mod client;
mod endpoints;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    api_envelope, ApiClient, ApiError, ApiResult, HttpRequest, HttpResponse, HttpTransport,
    Method, RequestOptions, RetryPolicy, Transport,
};
pub use endpoints::{encode_slug, Endpoint};
