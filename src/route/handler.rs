// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Route handler trait
//!
//! A handler receives the route context for one captured request and must
//! resolve it with exactly one terminal operation (abort, resume, fulfill).
//! Async closures implement the trait directly.

use std::future::Future;

use async_trait::async_trait;

use super::context::RouteContext;
use crate::error::Result;

/// Callback invoked with a route context when its pattern matches
///
/// # Example
///
/// ```rust,no_run
/// use mustekala::{Response, RouteContext};
/// use reqwest::StatusCode;
///
/// async fn items_handler(route: RouteContext) -> mustekala::Result<()> {
///     let body = serde_json::json!([{"id": 1, "name": "widget"}]);
///     route.fulfill(Response::json_value(StatusCode::OK, &body)?).await
/// }
/// ```
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Handle one captured request
    async fn handle(&self, route: RouteContext) -> Result<()>;
}

#[async_trait]
impl<F, Fut> RouteHandler for F
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, route: RouteContext) -> Result<()> {
        self(route).await
    }
}
