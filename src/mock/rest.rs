// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Prebuilt CRUD simulation handler
//!
//! Maps HTTP methods onto a `MockStore` collection so a test can stand up
//! a full resource lifecycle with one registration. Missing identifiers
//! resolve as client-error responses, never as handler errors.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::store::MockStore;
use crate::error::Result;
use crate::http::Response;
use crate::route::{RouteContext, RouteHandler};

/// Route handler simulating a REST resource backed by a mock store
pub struct RestResource {
    store: MockStore,
    collection: String,
}

impl RestResource {
    /// Create a handler over one store collection
    pub fn new(store: MockStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// The backing store
    pub fn store(&self) -> &MockStore {
        &self.store
    }

    /// Identifier taken from the last path segment, if numeric
    fn item_id(url: &url::Url) -> Option<u64> {
        url.path_segments()?.next_back()?.parse().ok()
    }

    fn respond(&self, route: &RouteContext) -> Result<Response> {
        let request = route.request();
        let id = Self::item_id(&request.url);

        match (request.method.as_str(), id) {
            ("GET", Some(id)) => Ok(match self.store.get(&self.collection, id) {
                Some(record) => Response::json_value(StatusCode::OK, &record)?,
                None => Self::missing(&self.collection, id),
            }),
            ("GET", None) => {
                Response::json_value(StatusCode::OK, &self.store.list(&self.collection))
            }
            ("POST", None) => match request.body_json::<Value>() {
                Ok(value) => {
                    let (_, record) = self.store.create(&self.collection, value);
                    Response::json_value(StatusCode::CREATED, &record)
                }
                Err(e) => Response::json_value(
                    StatusCode::BAD_REQUEST,
                    &serde_json::json!({ "error": format!("invalid JSON body: {}", e) }),
                ),
            },
            ("PUT", Some(id)) | ("PATCH", Some(id)) => match request.body_json::<Value>() {
                Ok(value) => Ok(match self.store.update(&self.collection, id, value) {
                    Some(record) => Response::json_value(StatusCode::OK, &record)?,
                    None => Self::missing(&self.collection, id),
                }),
                Err(e) => Response::json_value(
                    StatusCode::BAD_REQUEST,
                    &serde_json::json!({ "error": format!("invalid JSON body: {}", e) }),
                ),
            },
            ("DELETE", Some(id)) => Ok(if self.store.delete(&self.collection, id) {
                Response::with_status(StatusCode::NO_CONTENT)
            } else {
                Self::missing(&self.collection, id)
            }),
            _ => Response::json_value(
                StatusCode::METHOD_NOT_ALLOWED,
                &serde_json::json!({
                    "error": format!("{} not supported here", request.method)
                }),
            ),
        }
    }

    fn missing(collection: &str, id: u64) -> Response {
        Response::not_found(format!("no record {} in '{}'", id, collection))
    }
}

#[async_trait]
impl RouteHandler for RestResource {
    async fn handle(&self, route: RouteContext) -> Result<()> {
        let response = self.respond(&route)?;
        tracing::debug!(
            method = %route.request().method,
            url = %route.request().url,
            status = ?response.status_code(),
            "Mock REST resource"
        );
        route.fulfill(response).await
    }
}

/// Convenience constructor returning a registry-ready handler
pub fn rest_resource(store: MockStore, collection: impl Into<String>) -> Arc<dyn RouteHandler> {
    Arc::new(RestResource::new(store, collection))
}
