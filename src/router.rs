// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-page request dispatch
//!
//! Captured requests arrive over a channel and are delivered to handlers
//! one at a time in capture order. A handler's async work suspends only
//! its own request; forwarded network calls run on separate tasks so other
//! requests from the same page can be in flight concurrently. Separate
//! routers (pages) are fully independent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::events::{NetworkEventBus, RequestSnapshot};
use crate::http::{NetworkBackend, Request, Response};
use crate::route::{
    AbortReason, HandlerRegistry, HandlerScope, Resolution, RouteContext, RouteHandle,
    RouteHandler, RoutePattern,
};

/// Final action produced for one captured request
#[derive(Debug)]
pub enum RequestOutcome {
    /// Synthesized without touching the real network
    Fulfilled(Response),
    /// Forwarded to the real network (possibly with overrides); a transport
    /// failure arrives as a descriptor with no status
    Continued(Response),
    /// Marked failed with a classification
    Aborted(AbortReason),
}

impl RequestOutcome {
    /// The response descriptor, when one exists
    pub fn response(&self) -> Option<&Response> {
        match self {
            RequestOutcome::Fulfilled(response) | RequestOutcome::Continued(response) => {
                Some(response)
            }
            RequestOutcome::Aborted(_) => None,
        }
    }
}

/// A handler error surfaced to the owning test
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    /// Request method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Error detail
    pub message: String,
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum events kept in the bus log
    pub max_events: usize,
    /// Capture request bodies into event snapshots
    pub capture_bodies: bool,
    /// Maximum body size to capture
    pub max_body_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_events: 1000,
            capture_bodies: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl RouterConfig {
    /// Set max events
    pub fn max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set body capture settings
    pub fn capture_bodies(mut self, capture: bool, max_size: usize) -> Self {
        self.capture_bodies = capture;
        self.max_body_size = max_size;
        self
    }
}

struct Captured {
    request: Request,
    /// Matched at capture time; later registrations never affect this request
    registration: Option<crate::route::Registration>,
    reply: oneshot::Sender<RequestOutcome>,
}

struct RouterState {
    config: RouterConfig,
    page_routes: Arc<HandlerRegistry>,
    context_routes: Arc<HandlerRegistry>,
    backend: Arc<dyn NetworkBackend>,
    events: Arc<NetworkEventBus>,
    failures: RwLock<Vec<HandlerFailure>>,
}

/// Per-page interception router
pub struct Router {
    state: Arc<RouterState>,
    capture_tx: mpsc::UnboundedSender<Captured>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Router {
    /// Create a router with default configuration
    pub fn new(backend: Arc<dyn NetworkBackend>) -> Self {
        Self::with_config(backend, RouterConfig::default())
    }

    /// Create a router with custom configuration
    pub fn with_config(backend: Arc<dyn NetworkBackend>, config: RouterConfig) -> Self {
        Self::build(backend, config, Arc::new(HandlerRegistry::new()))
    }

    /// Create a router sharing context-scoped routes with other pages
    pub fn with_context_routes(
        backend: Arc<dyn NetworkBackend>,
        config: RouterConfig,
        context_routes: Arc<HandlerRegistry>,
    ) -> Self {
        Self::build(backend, config, context_routes)
    }

    fn build(
        backend: Arc<dyn NetworkBackend>,
        config: RouterConfig,
        context_routes: Arc<HandlerRegistry>,
    ) -> Self {
        let events = Arc::new(NetworkEventBus::new(config.max_events));
        let state = Arc::new(RouterState {
            config,
            page_routes: Arc::new(HandlerRegistry::new()),
            context_routes,
            backend,
            events,
            failures: RwLock::new(Vec::new()),
        });

        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(dispatch_loop(state.clone(), capture_rx, shutdown_rx));

        Self {
            state,
            capture_tx,
            shutdown,
            closed: AtomicBool::new(false),
        }
    }

    /// Register a page-scoped route handler
    pub fn route(&self, pattern: RoutePattern, handler: Arc<dyn RouteHandler>) -> RouteHandle {
        self.route_scoped(pattern, handler, HandlerScope::Page)
    }

    /// Register a route handler with an explicit scope
    pub fn route_scoped(
        &self,
        pattern: RoutePattern,
        handler: Arc<dyn RouteHandler>,
        scope: HandlerScope,
    ) -> RouteHandle {
        match scope {
            HandlerScope::Page => self.state.page_routes.register(pattern, handler, scope),
            HandlerScope::Context => self.state.context_routes.register(pattern, handler, scope),
        }
    }

    /// Remove a registration; in-flight requests are unaffected
    ///
    /// The handle's scope selects the registry, so a page handle never
    /// removes a context registration with the same sequence number (and
    /// vice versa).
    pub fn unroute(&self, handle: &RouteHandle) -> bool {
        match handle.scope() {
            HandlerScope::Page => self.state.page_routes.unregister(handle),
            HandlerScope::Context => self.state.context_routes.unregister(handle),
        }
    }

    /// Remove all registrations in a scope
    pub fn clear_routes(&self, scope: HandlerScope) {
        match scope {
            HandlerScope::Page => self.state.page_routes.clear_all(),
            HandlerScope::Context => self.state.context_routes.clear(scope),
        }
    }

    /// Submit a captured request; the receiver resolves with the outcome
    ///
    /// Multiple captures may be pending at once; handlers still run one at
    /// a time in capture order.
    pub fn capture(&self, request: Request) -> Result<oneshot::Receiver<RequestOutcome>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        // Page-scoped routes win over context-scoped fixtures; within a
        // scope, last-registered wins. Matching happens exactly once, here,
        // so registrations made later never affect this request.
        let registration = self
            .state
            .page_routes
            .find_match(&request.url)
            .or_else(|| self.state.context_routes.find_match(&request.url));

        let (reply, rx) = oneshot::channel();
        self.capture_tx
            .send(Captured {
                request,
                registration,
                reply,
            })
            .map_err(|_| Error::Closed)?;
        Ok(rx)
    }

    /// Capture a request and await its resolution
    pub async fn handle_request(&self, request: Request) -> Result<RequestOutcome> {
        let rx = self.capture(request)?;
        rx.await.map_err(|_| Error::Closed)
    }

    /// The event bus for this page
    pub fn events(&self) -> &Arc<NetworkEventBus> {
        &self.state.events
    }

    /// The shared context-scoped registry
    pub fn context_routes(&self) -> Arc<HandlerRegistry> {
        self.state.context_routes.clone()
    }

    /// Handler errors surfaced so the owning test can fail on them
    pub fn failures(&self) -> Vec<HandlerFailure> {
        self.state.failures.read().clone()
    }

    /// Check if any handler has failed
    pub fn has_failures(&self) -> bool {
        !self.state.failures.read().is_empty()
    }

    /// Tear the page scope down
    ///
    /// Unresolved requests are force-resolved as `abort("context-closed")`;
    /// later captures fail with `Error::Closed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.shutdown.send(true);
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.close();
    }
}

async fn dispatch_loop(
    state: Arc<RouterState>,
    mut capture_rx: mpsc::UnboundedReceiver<Captured>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let captured = tokio::select! {
            _ = shutdown.changed() => break,
            msg = capture_rx.recv() => match msg {
                Some(captured) => captured,
                None => return,
            },
        };

        if !process(&state, captured, &mut shutdown).await {
            break;
        }
    }

    // Scope teardown: everything still queued resolves as aborted
    capture_rx.close();
    while let Ok(captured) = capture_rx.try_recv() {
        let snapshot = snapshot_of(&state, &captured.request);
        state.events.emit_failed(
            snapshot,
            AbortReason::ContextClosed.as_str(),
            std::time::Duration::ZERO,
        );
        let _ = captured
            .reply
            .send(RequestOutcome::Aborted(AbortReason::ContextClosed));
    }
}

fn snapshot_of(state: &RouterState, request: &Request) -> RequestSnapshot {
    RequestSnapshot::from_request(
        request,
        state.config.capture_bodies,
        state.config.max_body_size,
    )
}

/// Process one captured request; returns false when shutdown interrupted it
async fn process(
    state: &Arc<RouterState>,
    captured: Captured,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let Captured {
        request,
        registration,
        reply,
    } = captured;
    let start = Instant::now();
    let snapshot = snapshot_of(state, &request);

    state.events.emit_started(snapshot.clone());

    let Some(registration) = registration else {
        tracing::trace!(method = %request.method, url = %request.url, "No route matched");
        forward(state.clone(), request, snapshot, reply, start);
        return true;
    };

    tracing::debug!(
        method = %request.method,
        url = %request.url,
        pattern = %registration.pattern,
        "Route matched"
    );

    let (route, mut resolution_rx) = RouteContext::new(request.clone(), state.backend.clone());

    let handler = registration.handler.clone();
    let handler_route = route.clone();
    let handler_result = tokio::select! {
        _ = shutdown.changed() => {
            route.force_abort(AbortReason::ContextClosed);
            state.events.emit_failed(
                snapshot,
                AbortReason::ContextClosed.as_str(),
                start.elapsed(),
            );
            let _ = reply.send(RequestOutcome::Aborted(AbortReason::ContextClosed));
            return false;
        }
        result = std::panic::AssertUnwindSafe(handler.handle(handler_route)).catch_unwind() => {
            result
        }
    };

    let handler_error = match handler_result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(panic) => Some(panic_message(panic)),
    };

    if let Some(ref message) = handler_error {
        tracing::error!(
            method = %snapshot.method,
            url = %snapshot.url,
            error = %message,
            "Route handler failed"
        );
        state.failures.write().push(HandlerFailure {
            method: snapshot.method.clone(),
            url: snapshot.url.clone(),
            message: message.clone(),
        });
    }

    match resolution_rx.try_recv() {
        Ok(Resolution::Fulfill(response)) => {
            state
                .events
                .emit_finished(snapshot, &response, start.elapsed());
            let _ = reply.send(RequestOutcome::Fulfilled(*response));
        }
        Ok(Resolution::Abort(reason)) => {
            state
                .events
                .emit_failed(snapshot, reason.as_str(), start.elapsed());
            let _ = reply.send(RequestOutcome::Aborted(reason));
        }
        Ok(Resolution::Resume(overrides)) => {
            let request = match overrides {
                Some(overrides) => request.with_overrides(overrides),
                None => request,
            };
            forward(state.clone(), request, snapshot, reply, start);
        }
        Err(_) => {
            // Handler finished without resolving the context
            if handler_error.is_some() {
                route.force_abort(AbortReason::HandlerError);
                state.events.emit_failed(
                    snapshot,
                    AbortReason::HandlerError.as_str(),
                    start.elapsed(),
                );
                let _ = reply.send(RequestOutcome::Aborted(AbortReason::HandlerError));
            } else {
                tracing::warn!(
                    method = %snapshot.method,
                    url = %snapshot.url,
                    "Handler returned without resolving; continuing unmodified"
                );
                forward(state.clone(), request, snapshot, reply, start);
            }
        }
    }

    true
}

/// Dispatch to the real network on a separate task so the page's handler
/// stream is not blocked by network latency
fn forward(
    state: Arc<RouterState>,
    request: Request,
    snapshot: RequestSnapshot,
    reply: oneshot::Sender<RequestOutcome>,
    start: Instant,
) {
    tokio::spawn(async move {
        let response = match state.backend.dispatch(request).await {
            Ok(response) => response,
            Err(e) => Response::failed(e.to_string()),
        };

        if response.is_failed() {
            let error = response
                .error
                .clone()
                .unwrap_or_else(|| "fetch failed".to_string());
            state.events.emit_failed(snapshot, error, start.elapsed());
        } else {
            state
                .events
                .emit_finished(snapshot, &response, start.elapsed());
        }

        let _ = reply.send(RequestOutcome::Continued(response));
    });
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}
