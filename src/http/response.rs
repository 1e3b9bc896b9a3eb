// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response descriptor produced by fulfillment or a real fetch

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Response descriptor for an intercepted exchange
///
/// A failed real fetch is represented with `status: None` and an error
/// message, so the handler explicitly chooses between propagating the
/// failure and fulfilling with mock data anyway.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code (`None` when the real fetch failed)
    pub status: Option<StatusCode>,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// Whether this descriptor came from a real network fetch
    pub from_real_fetch: bool,
    /// Transport error message when the real fetch failed
    pub error: Option<String>,
    /// Response time in milliseconds (0 for synthesized responses)
    pub response_time_ms: u64,
}

impl Response {
    /// Create a synthesized response with a status code
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            from_real_fetch: false,
            error: None,
            response_time_ms: 0,
        }
    }

    /// Create a 200 OK response
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create a JSON response with the given status
    pub fn json_value<T: Serialize>(status: StatusCode, data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data)?;
        let mut response = Self::with_status(status);
        response.headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );
        response.body = Bytes::from(body);
        Ok(response)
    }

    /// Create a 404 Not Found response with a JSON error body
    pub fn not_found(message: impl AsRef<str>) -> Self {
        Self::json_value(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "error": message.as_ref() }),
        )
        .unwrap_or_else(|_| Self::with_status(StatusCode::NOT_FOUND))
    }

    /// Create a failed-fetch descriptor with no status
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            from_real_fetch: true,
            error: Some(error.into()),
            response_time_ms: 0,
        }
    }

    /// Check if the real fetch failed at transport level
    pub fn is_failed(&self) -> bool {
        self.status.is_none()
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.map(|s| s.is_success()).unwrap_or(false)
    }

    /// Check if status is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        self.status.map(|s| s.is_redirection()).unwrap_or(false)
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.map(|s| s.is_client_error()).unwrap_or(false)
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.map(|s| s.is_server_error()).unwrap_or(false)
    }

    /// Get status code as u16, if any
    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.as_u16())
    }

    /// Get body as text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::Other(e.to_string()))
    }

    /// Get body as text, lossy conversion
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any existing value
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if content type is JSON
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }

    /// Get content length header, if present
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// Get body length
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_response() {
        let resp = Response::ok();
        assert!(resp.is_success());
        assert_eq!(resp.status_code(), Some(200));
        assert!(!resp.from_real_fetch);
    }

    #[test]
    fn test_json_response() {
        let resp =
            Response::json_value(StatusCode::CREATED, &serde_json::json!({"id": 1})).unwrap();
        assert_eq!(resp.status_code(), Some(201));
        assert!(resp.is_json());
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_failed_fetch() {
        let resp = Response::failed("connection reset");
        assert!(resp.is_failed());
        assert!(!resp.is_success());
        assert_eq!(resp.status_code(), None);
        assert_eq!(resp.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_not_found_shape() {
        let resp = Response::not_found("item 42 does not exist");
        assert!(resp.is_client_error());
        let value: serde_json::Value = resp.json().unwrap();
        assert!(value["error"].as_str().unwrap().contains("42"));
    }
}
