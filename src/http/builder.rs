// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response builder for fulfillment
//!
//! Builds a response descriptor from literal values, or from a previously
//! fetched real response with selective overrides. Unspecified fields inherit
//! the real response's values; headers merge by key with builder-supplied
//! values taking precedence.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;

use super::response::Response;
use crate::error::{Error, Result};

/// Body payload accepted by the builder
enum BodyKind {
    Bytes(Bytes),
    Text(String),
    Json(serde_json::Value),
}

/// Builder for fulfillment responses
pub struct ResponseBuilder {
    base: Option<Response>,
    status: Option<StatusCode>,
    headers: HeaderMap,
    content_type: Option<String>,
    body: Option<BodyKind>,
}

impl ResponseBuilder {
    /// Start from scratch (literal values only)
    pub fn new() -> Self {
        Self {
            base: None,
            status: None,
            headers: HeaderMap::new(),
            content_type: None,
            body: None,
        }
    }

    /// Start from a previously fetched real response
    ///
    /// Fields not set on the builder inherit the real response's values.
    pub fn from_response(response: Response) -> Self {
        Self {
            base: Some(response),
            status: None,
            headers: HeaderMap::new(),
            content_type: None,
            body: None,
        }
    }

    /// Set the status code
    pub fn status(mut self, status: u16) -> Result<Self> {
        self.status = Some(
            StatusCode::from_u16(status)
                .map_err(|e| Error::Config(format!("invalid status {}: {}", status, e)))?,
        );
        Ok(self)
    }

    /// Set the status code from a `StatusCode`
    pub fn status_code(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Set a header (overrides an inherited header of the same key)
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the content type explicitly
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the body from raw bytes
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(BodyKind::Bytes(body.into()));
        self
    }

    /// Set the body from UTF-8 text (defaults content-type to text/plain)
    pub fn body_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(BodyKind::Text(body.into()));
        self
    }

    /// Set the body from a structured value, serialized as canonical JSON
    /// (defaults content-type to application/json)
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.body = Some(BodyKind::Json(serde_json::to_value(data)?));
        Ok(self)
    }

    /// Build the final response descriptor
    pub fn build(self) -> Result<Response> {
        let (mut headers, inherited_status, inherited_body, from_real_fetch, response_time_ms) =
            match self.base {
                Some(base) => (
                    base.headers,
                    base.status,
                    Some(base.body),
                    base.from_real_fetch,
                    base.response_time_ms,
                ),
                None => (HeaderMap::new(), None, None, false, 0),
            };

        // Builder headers win on key collision
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let status = self
            .status
            .or(inherited_status)
            .unwrap_or(StatusCode::OK);

        let (body, default_content_type) = match self.body {
            Some(BodyKind::Bytes(b)) => (b, None),
            Some(BodyKind::Text(t)) => (
                Bytes::from(t),
                Some("text/plain; charset=utf-8"),
            ),
            Some(BodyKind::Json(v)) => (
                Bytes::from(serde_json::to_vec(&v)?),
                Some("application/json"),
            ),
            None => (inherited_body.unwrap_or_default(), None),
        };

        if let Some(ct) = self.content_type {
            if let Ok(value) = HeaderValue::try_from(ct.as_str()) {
                headers.insert("content-type", value);
            }
        } else if let Some(ct) = default_content_type {
            if !headers.contains_key("content-type") {
                headers.insert("content-type", HeaderValue::from_static(ct));
            }
        }

        Ok(Response {
            status: Some(status),
            headers,
            body,
            from_real_fetch,
            error: None,
            response_time_ms,
        })
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
