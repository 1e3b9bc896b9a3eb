// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Mustekala - Request Interception and Mocking Layer
//!
//! A pure Rust interception layer for browser-automation test runtimes.
//! The host engine hands every captured outbound request to a per-page
//! router; registered handlers decide to abort, continue, or fulfill,
//! optionally backed by a real fetch and stateful mock collections.
//!
//! ## Features
//!
//! - Glob/regex/predicate route patterns (`*` per segment, `**` across)
//! - Last-registered-wins precedence: test overrides beat broad fixtures
//! - Exactly-once resolution: double resolution fails loudly, in the test
//! - Fetch-then-mutate: real fetch without resolving, transform, fulfill
//! - Stateful CRUD simulation with never-reused monotonic identifiers
//! - Lifecycle event bus with panic-isolated subscribers and waiters
//! - Handler errors auto-abort and surface on the owning test's channel
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mustekala::{
//!     HttpBackend, Request, Response, RoutePattern, Router, RouteContext,
//! };
//! use reqwest::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new(Arc::new(HttpBackend::new()?));
//!
//!     router.route(
//!         RoutePattern::glob("**/api/items")?,
//!         Arc::new(|route: RouteContext| async move {
//!             let body = serde_json::json!([{"id": 1, "name": "widget"}]);
//!             route.fulfill(Response::json_value(StatusCode::OK, &body)?).await
//!         }),
//!     );
//!
//!     let outcome = router
//!         .handle_request(Request::get("https://example.com/api/items")?)
//!         .await?;
//!     println!("mocked: {:?}", outcome.response().map(|r| r.status_code()));
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod events;
pub mod http;
pub mod mock;
pub mod route;
pub mod router;

// Re-exports for convenience

// Errors
pub use error::{Error, ErrorContext, Result};

// HTTP shapes and backend
pub use http::{
    HttpBackend, HttpBackendConfig, NetworkBackend, NoNetworkBackend, Request, RequestOverrides,
    ResourceType, Response, ResponseBuilder,
};

// Routing
pub use route::{
    AbortReason, GlobPattern, HandlerRegistry, HandlerScope, RouteContext, RouteHandle,
    RouteHandler, RoutePattern,
};

// Mock store
pub use mock::{rest_resource, MockStore, RestResource};

// Events
pub use events::{
    CompletedExchange, EventCallback, EventPhase, NetworkEvent, NetworkEventBus, RequestSnapshot,
};

// Router
pub use router::{HandlerFailure, RequestOutcome, Router, RouterConfig};

/// Mustekala version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
