// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Network event bus
//!
//! Publishes request lifecycle events to passive observers, independent of
//! whether the request was matched or mocked. Subscribers never block
//! resolution: a panicking subscriber is isolated and reported, and waiters
//! ride a broadcast channel on the side.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::http::{Request, ResourceType, Response};

/// Event subscriber callback type
pub type EventCallback = Arc<dyn Fn(&NetworkEvent) + Send + Sync>;

/// Lifecycle phase of a network event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    /// Request captured and entering dispatch
    RequestStarted,
    /// Request resolved with a response (mocked or real)
    RequestFinished,
    /// Request aborted or failed at transport level
    RequestFailed,
}

/// Serializable snapshot of a captured request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// HTTP method
    pub method: String,
    /// Full URL
    pub url: String,
    /// Resource type reported by the host
    pub resource_type: ResourceType,
    /// Request body (possibly truncated, lossy UTF-8)
    pub body: Option<String>,
}

impl RequestSnapshot {
    /// Snapshot a request, truncating the body to `max_body_size`
    pub fn from_request(request: &Request, capture_bodies: bool, max_body_size: usize) -> Self {
        let body = if capture_bodies {
            request.body.as_ref().map(|b| {
                String::from_utf8_lossy(&b[..b.len().min(max_body_size)]).into_owned()
            })
        } else {
            None
        };

        Self {
            method: request.method.to_string(),
            url: request.url.to_string(),
            resource_type: request.resource_type,
            body,
        }
    }
}

/// One network lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEvent {
    /// Event ID, increasing in lifecycle order per bus
    pub id: u64,
    /// Lifecycle phase
    pub phase: EventPhase,
    /// Timestamp
    pub timestamp: SystemTime,
    /// Originating request
    pub request: RequestSnapshot,
    /// Final status, if finished
    pub status: Option<u16>,
    /// Time from capture to resolution in milliseconds
    pub duration_ms: Option<u64>,
    /// Abort classification or transport error, if failed
    pub error: Option<String>,
    /// Whether the response was synthesized without the real network
    pub mocked: bool,
}

/// A finished exchange delivered to waiters
#[derive(Debug, Clone)]
pub struct CompletedExchange {
    /// Originating request
    pub request: RequestSnapshot,
    /// Final response descriptor
    pub response: Response,
}

/// Publish/subscribe bus for request lifecycle events
pub struct NetworkEventBus {
    subscribers: RwLock<Vec<EventCallback>>,
    log: RwLock<Vec<NetworkEvent>>,
    max_events: usize,
    event_counter: AtomicU64,
    subscriber_errors: AtomicU64,
    completed: broadcast::Sender<Arc<CompletedExchange>>,
}

impl NetworkEventBus {
    /// Create a bus keeping at most `max_events` in the log
    pub fn new(max_events: usize) -> Self {
        let (completed, _) = broadcast::channel(256);
        Self {
            subscribers: RwLock::new(Vec::new()),
            log: RwLock::new(Vec::new()),
            max_events,
            event_counter: AtomicU64::new(0),
            subscriber_errors: AtomicU64::new(0),
            completed,
        }
    }

    /// Subscribe a passive observer
    pub fn subscribe(&self, callback: EventCallback) {
        self.subscribers.write().push(callback);
    }

    /// Emit a request-started event
    pub fn emit_started(&self, request: RequestSnapshot) {
        self.emit(NetworkEvent {
            id: self.next_id(),
            phase: EventPhase::RequestStarted,
            timestamp: SystemTime::now(),
            request,
            status: None,
            duration_ms: None,
            error: None,
            mocked: false,
        });
    }

    /// Emit a request-finished event and wake matching waiters
    pub fn emit_finished(
        &self,
        request: RequestSnapshot,
        response: &Response,
        duration: Duration,
    ) {
        self.emit(NetworkEvent {
            id: self.next_id(),
            phase: EventPhase::RequestFinished,
            timestamp: SystemTime::now(),
            request: request.clone(),
            status: response.status_code(),
            duration_ms: Some(duration.as_millis() as u64),
            error: None,
            mocked: !response.from_real_fetch,
        });

        // Waiters are best-effort; no receivers is fine
        let _ = self.completed.send(Arc::new(CompletedExchange {
            request,
            response: response.clone(),
        }));
    }

    /// Emit a request-failed event
    pub fn emit_failed(&self, request: RequestSnapshot, error: impl Into<String>, duration: Duration) {
        self.emit(NetworkEvent {
            id: self.next_id(),
            phase: EventPhase::RequestFailed,
            timestamp: SystemTime::now(),
            request,
            status: None,
            duration_ms: Some(duration.as_millis() as u64),
            error: Some(error.into()),
            mocked: false,
        });
    }

    /// Resolve with the first completed exchange satisfying the predicate,
    /// or fail with a timeout error
    pub async fn wait_for_next<P>(&self, predicate: P, timeout: Duration) -> Result<CompletedExchange>
    where
        P: Fn(&RequestSnapshot, &Response) -> bool,
    {
        let mut receiver = self.completed.subscribe();

        let wait = async {
            loop {
                match receiver.recv().await {
                    Ok(exchange) => {
                        if predicate(&exchange.request, &exchange.response) {
                            return Ok(CompletedExchange::clone(&exchange));
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event waiter lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(Error::Closed);
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout("wait_for_next", timeout.as_millis() as u64)),
        }
    }

    /// Get all logged events
    pub fn events(&self) -> Vec<NetworkEvent> {
        self.log.read().clone()
    }

    /// Get logged events whose URL contains the given fragment
    pub fn events_for(&self, url_fragment: &str) -> Vec<NetworkEvent> {
        self.log
            .read()
            .iter()
            .filter(|e| e.request.url.contains(url_fragment))
            .cloned()
            .collect()
    }

    /// Get logged failure events
    pub fn failed(&self) -> Vec<NetworkEvent> {
        self.log
            .read()
            .iter()
            .filter(|e| e.phase == EventPhase::RequestFailed)
            .cloned()
            .collect()
    }

    /// Clear the event log
    pub fn clear(&self) {
        self.log.write().clear();
    }

    /// Number of logged events
    pub fn event_count(&self) -> usize {
        self.log.read().len()
    }

    /// Number of subscriber callbacks that panicked
    pub fn subscriber_errors(&self) -> u64 {
        self.subscriber_errors.load(Ordering::Relaxed)
    }

    /// Export the event log as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events())
    }

    fn next_id(&self) -> u64 {
        self.event_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn emit(&self, event: NetworkEvent) {
        for callback in self.subscribers.read().iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                self.subscriber_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    url = %event.request.url,
                    phase = ?event.phase,
                    "Event subscriber panicked; isolated"
                );
            }
        }

        let mut log = self.log.write();
        if log.len() >= self.max_events {
            log.remove(0);
        }
        log.push(event);
    }
}

impl Default for NetworkEventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn snapshot(url: &str) -> RequestSnapshot {
        let request = Request::get(url).unwrap();
        RequestSnapshot::from_request(&request, true, 1024)
    }

    #[test]
    fn test_event_log_order() {
        let bus = NetworkEventBus::new(100);
        bus.emit_started(snapshot("https://example.com/a"));
        bus.emit_finished(
            snapshot("https://example.com/a"),
            &Response::ok(),
            Duration::from_millis(5),
        );

        let events = bus.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, EventPhase::RequestStarted);
        assert_eq!(events[1].phase, EventPhase::RequestFinished);
        assert!(events[0].id < events[1].id);
        assert_eq!(events[1].status, Some(200));
        assert!(events[1].mocked);
    }

    #[test]
    fn test_log_cap_drops_oldest() {
        let bus = NetworkEventBus::new(2);
        bus.emit_started(snapshot("https://example.com/1"));
        bus.emit_started(snapshot("https://example.com/2"));
        bus.emit_started(snapshot("https://example.com/3"));

        let events = bus.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].request.url.ends_with("/2"));
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let bus = NetworkEventBus::new(10);
        bus.subscribe(Arc::new(|_event| panic!("observer bug")));

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = seen.clone();
        bus.subscribe(Arc::new(move |_event| {
            seen_clone.fetch_add(1, Ordering::Relaxed);
        }));

        bus.emit_started(snapshot("https://example.com/a"));

        // Pipeline survived, later subscriber still ran, panic was counted
        assert_eq!(bus.event_count(), 1);
        assert_eq!(seen.load(Ordering::Relaxed), 1);
        assert_eq!(bus.subscriber_errors(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_next_matches_predicate() {
        let bus = Arc::new(NetworkEventBus::new(10));

        let bus_clone = bus.clone();
        let waiter = tokio::spawn(async move {
            bus_clone
                .wait_for_next(
                    |request, response| {
                        request.url.contains("/api/items") && response.is_success()
                    },
                    Duration::from_secs(2),
                )
                .await
        });

        // Let the waiter subscribe before emitting
        tokio::time::sleep(Duration::from_millis(20)).await;

        bus.emit_finished(
            snapshot("https://example.com/other"),
            &Response::ok(),
            Duration::ZERO,
        );
        bus.emit_finished(
            snapshot("https://example.com/api/items"),
            &Response::with_status(StatusCode::OK),
            Duration::ZERO,
        );

        let exchange = waiter.await.unwrap().unwrap();
        assert!(exchange.request.url.contains("/api/items"));
    }

    #[tokio::test]
    async fn test_wait_for_next_times_out() {
        let bus = NetworkEventBus::new(10);
        let err = bus
            .wait_for_next(|_, _| true, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_failed_filter_and_json_export() {
        let bus = NetworkEventBus::new(10);
        bus.emit_failed(
            snapshot("https://example.com/a"),
            "handler-error",
            Duration::ZERO,
        );
        assert_eq!(bus.failed().len(), 1);
        assert_eq!(bus.failed()[0].error.as_deref(), Some("handler-error"));

        let json = bus.to_json().unwrap();
        assert!(json.contains("handler-error"));
    }
}
