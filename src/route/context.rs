// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Route context: the mutable view of one intercepted request
//!
//! Created fresh per captured request and never reused. A context resolves
//! with exactly one terminal operation (abort, resume, fulfill); a second
//! terminal call fails loudly so broken tests are caught in development.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::http::{NetworkBackend, Request, RequestOverrides, Response};

/// Error classification supplied when aborting a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AbortReason {
    /// Connection refused by the (simulated) peer
    ConnectionRefused,
    /// Request timed out
    TimedOut,
    /// Blocked by a client rule
    BlockedByClient,
    /// A handler failed before resolving the request
    HandlerError,
    /// The owning page/context tore down while the request was unresolved
    ContextClosed,
    /// Generic failure
    Failed,
}

impl AbortReason {
    /// Kebab-case classification string surfaced to the host runtime
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::ConnectionRefused => "connection-refused",
            AbortReason::TimedOut => "timed-out",
            AbortReason::BlockedByClient => "blocked-by-client",
            AbortReason::HandlerError => "handler-error",
            AbortReason::ContextClosed => "context-closed",
            AbortReason::Failed => "failed",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal resolution of a route context
#[derive(Debug)]
pub(crate) enum Resolution {
    /// Mark the request failed with a classification
    Abort(AbortReason),
    /// Forward to the real network, optionally with overrides
    Resume(Option<RequestOverrides>),
    /// Synthesize a response without touching the network
    Fulfill(Box<Response>),
}

impl Resolution {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Resolution::Abort(_) => "abort",
            Resolution::Resume(_) => "resume",
            Resolution::Fulfill(_) => "fulfill",
        }
    }
}

enum SlotState {
    Pending(oneshot::Sender<Resolution>),
    Resolved(&'static str),
}

struct RouteInner {
    request: Request,
    backend: Arc<dyn NetworkBackend>,
    slot: Mutex<SlotState>,
}

/// Mutable view of one intercepted request, handed to the matched handler
#[derive(Clone)]
pub struct RouteContext {
    inner: Arc<RouteInner>,
}

impl RouteContext {
    /// Create a context and the receiver the dispatcher resolves on
    pub(crate) fn new(
        request: Request,
        backend: Arc<dyn NetworkBackend>,
    ) -> (Self, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        let context = Self {
            inner: Arc::new(RouteInner {
                request,
                backend,
                slot: Mutex::new(SlotState::Pending(tx)),
            }),
        };
        (context, rx)
    }

    /// The captured request (read-only snapshot)
    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Whether a terminal operation has already been called
    pub fn is_resolved(&self) -> bool {
        matches!(*self.inner.slot.lock(), SlotState::Resolved(_))
    }

    /// Terminal: mark the request as failed with the given classification
    pub async fn abort(&self, reason: AbortReason) -> Result<()> {
        self.resolve(Resolution::Abort(reason))
    }

    /// Terminal: forward the request to the real network
    ///
    /// Named `resume` because `continue` is a Rust keyword. Optionally
    /// replaces method, URL, headers, or body. Does not re-trigger handler
    /// matching.
    pub async fn resume(&self, overrides: Option<RequestOverrides>) -> Result<()> {
        self.resolve(Resolution::Resume(overrides))
    }

    /// Terminal: synthesize a response without touching the real network
    pub async fn fulfill(&self, response: Response) -> Result<()> {
        self.resolve(Resolution::Fulfill(Box::new(response)))
    }

    /// Perform the real network call without resolving the context
    ///
    /// The returned descriptor can be inspected and transformed before
    /// calling `fulfill`. A transport failure comes back as a descriptor
    /// with no status; the handler chooses between `abort` and a synthetic
    /// success.
    pub async fn fetch(&self) -> Result<Response> {
        self.inner
            .backend
            .dispatch(self.inner.request.clone())
            .await
    }

    /// Like `fetch`, with request overrides applied first
    pub async fn fetch_with(&self, overrides: RequestOverrides) -> Result<Response> {
        self.inner
            .backend
            .dispatch(self.inner.request.clone().with_overrides(overrides))
            .await
    }

    /// Resolve as aborted if still pending; used by the dispatcher for
    /// handler errors and scope teardown. Returns false when the context
    /// was already resolved.
    pub(crate) fn force_abort(&self, reason: AbortReason) -> bool {
        let mut slot = self.inner.slot.lock();
        match std::mem::replace(&mut *slot, SlotState::Resolved("abort")) {
            SlotState::Pending(sender) => {
                let _ = sender.send(Resolution::Abort(reason));
                true
            }
            SlotState::Resolved(first) => {
                *slot = SlotState::Resolved(first);
                false
            }
        }
    }

    fn resolve(&self, resolution: Resolution) -> Result<()> {
        let kind = resolution.kind();
        let mut slot = self.inner.slot.lock();
        match std::mem::replace(&mut *slot, SlotState::Resolved(kind)) {
            SlotState::Pending(sender) => {
                if sender.send(resolution).is_err() {
                    // Dispatcher went away while the handler was running
                    return Err(Error::Closed);
                }
                Ok(())
            }
            SlotState::Resolved(first) => {
                *slot = SlotState::Resolved(first);
                Err(Error::AlreadyResolved {
                    method: self.inner.request.method.to_string(),
                    url: self.inner.request.url.to_string(),
                    first,
                    second: kind,
                })
            }
        }
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("method", &self.inner.request.method)
            .field("url", &self.inner.request.url.as_str())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
