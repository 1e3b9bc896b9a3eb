// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Real-network backend
//!
//! The host runtime supplies the real `fetch()` capability through the
//! `NetworkBackend` trait. `HttpBackend` is the default reqwest-based
//! implementation. Transport failures are returned as failed response
//! descriptors (no status), never as errors, so a handler can catch a
//! failed real fetch and still fulfill with mock data.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;

use super::request::Request;
use super::response::Response;
use crate::error::Result;

/// Default user agent for the backend client
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Mustekala/0.2";

/// Capability to perform a real network call for a captured request
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    /// Dispatch the request to the real network
    ///
    /// Transport failures come back as `Response::failed(..)`; `Err` is
    /// reserved for programming errors (the backend itself being unusable).
    async fn dispatch(&self, request: Request) -> Result<Response>;
}

/// HTTP backend configuration
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// User agent string
    pub user_agent: String,
    /// Default timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Default headers
    pub default_headers: HeaderMap,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("accept", HeaderValue::from_static("*/*"));
        default_headers.insert(
            "accept-language",
            HeaderValue::from_static("en-US,en;q=0.5"),
        );

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            accept_invalid_certs: false,
            default_headers,
        }
    }
}

/// Default reqwest-based network backend
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// Create a new backend with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpBackendConfig::default())
    }

    /// Create a new backend with custom configuration
    pub fn with_config(config: HttpBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(config.default_headers.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Get backend configuration
    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

#[async_trait]
impl NetworkBackend for HttpBackend {
    async fn dispatch(&self, request: Request) -> Result<Response> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    error = %e,
                    "Real fetch failed"
                );
                let mut failed = Response::failed(e.to_string());
                failed.response_time_ms = start.elapsed().as_millis() as u64;
                return Ok(failed);
            }
        };

        let status = response.status();
        let headers = response.headers().clone();

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let mut failed = Response::failed(e.to_string());
                failed.response_time_ms = start.elapsed().as_millis() as u64;
                return Ok(failed);
            }
        };

        Ok(Response {
            status: Some(status),
            headers,
            body,
            from_real_fetch: true,
            error: None,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP backend")
    }
}

/// Backend that fails every dispatch, for hosts that forbid real network
/// access during a test run
pub struct NoNetworkBackend;

#[async_trait]
impl NetworkBackend for NoNetworkBackend {
    async fn dispatch(&self, request: Request) -> Result<Response> {
        let _ = request;
        Ok(Response::failed("real network access is disabled"))
    }
}

impl NoNetworkBackend {
    /// Create a new no-network backend
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoNetworkBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = HttpBackend::new().unwrap();
        assert_eq!(backend.config().user_agent, DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_no_network_backend() {
        let backend = NoNetworkBackend::new();
        let request = Request::get("https://example.com").unwrap();
        let response = backend.dispatch(request).await.unwrap();
        assert!(response.is_failed());
        assert!(response.error.as_deref().unwrap().contains("disabled"));
    }
}
