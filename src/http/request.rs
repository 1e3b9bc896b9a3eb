// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Captured request representation and continue-overrides

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::Result;

/// Resource type of a captured request, as reported by the host runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResourceType {
    /// Direct navigation
    Document,
    /// XMLHttpRequest
    Xhr,
    /// Fetch API
    Fetch,
    /// Script tag
    Script,
    /// Link stylesheet
    Stylesheet,
    /// Image
    Image,
    /// Font
    Font,
    /// Media (audio/video)
    Media,
    /// WebSocket handshake
    WebSocket,
    /// EventSource/SSE
    EventSource,
    /// Unknown
    Other,
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Other
    }
}

/// A request captured by the host runtime, before interception
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers (ordered, keys case-insensitive)
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
    /// Resource type
    pub resource_type: ResourceType,
    /// Per-request timeout for the real network call
    pub timeout: Option<Duration>,
}

impl Request {
    /// Create a new GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Create a new POST request
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Create a new DELETE request
    pub fn delete(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::DELETE, url)
    }

    /// Create a new PUT request
    pub fn put(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::PUT, url)
    }

    /// Create a new request with arbitrary method
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            method,
            url: Url::parse(url.as_ref())?,
            headers: HeaderMap::new(),
            body: None,
            resource_type: ResourceType::default(),
            timeout: Some(Duration::from_secs(30)),
        })
    }

    /// Set a header
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set multiple headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                self.headers.insert(name, value);
            }
        }
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set JSON body
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let json = serde_json::to_vec(data)?;
        self.body = Some(Bytes::from(json));
        self = self.header("content-type", "application/json");
        Ok(self)
    }

    /// Set the resource type
    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// Set timeout for the real network call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the URL as string
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Get the host
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Get a header value
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get body as text, lossy conversion
    pub fn body_text_lossy(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Parse body as JSON
    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| crate::error::Error::other("request has no body"))?;
        serde_json::from_slice(body).map_err(crate::error::Error::from)
    }

    /// Apply overrides, producing the request that goes to the network
    pub fn with_overrides(mut self, overrides: RequestOverrides) -> Self {
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if let Some(url) = overrides.url {
            self.url = url;
        }
        for (name, value) in overrides.headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        if let Some(body) = overrides.body {
            self.body = Some(body);
        }
        self
    }
}

/// Selective replacements applied when a route is continued to the network
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// Replacement method
    pub method: Option<Method>,
    /// Replacement URL
    pub url: Option<Url>,
    /// Headers to set (merged over the original, replaced keys win)
    pub headers: HeaderMap,
    /// Replacement body
    pub body: Option<Bytes>,
}

impl RequestOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Replace the URL
    pub fn url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set a header override
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Replace the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Check if no overrides are set
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
    }
}
