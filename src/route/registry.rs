// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Handler registry
//!
//! Append-ordered collection of (pattern, handler, scope) registrations.
//! Lookup scans newest-first so test-specific overrides registered later
//! take precedence over broader fixtures registered earlier. Matching
//! happens once, at capture time; registering while requests are in flight
//! only affects future captures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use super::handler::RouteHandler;
use super::pattern::RoutePattern;

/// Lifetime boundary governing when a registration is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerScope {
    /// Cleared when the page closes
    Page,
    /// Shared across pages in a browsing context
    Context,
}

/// Handle identifying one registration, for unregistering
///
/// Carries the scope it was registered under; sequence numbers are only
/// unique within one registry, so the scope disambiguates handles from
/// page- and context-level registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle {
    id: u64,
    scope: HandlerScope,
}

impl RouteHandle {
    /// Raw registration sequence number
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scope the registration belongs to
    pub fn scope(&self) -> HandlerScope {
        self.scope
    }
}

/// One registered (pattern, handler, scope) entry
#[derive(Clone)]
pub struct Registration {
    /// Registration sequence number, monotonically increasing
    pub registered_at: u64,
    /// Matching rule
    pub pattern: RoutePattern,
    /// Handler callback
    pub handler: Arc<dyn RouteHandler>,
    /// Owning scope
    pub scope: HandlerScope,
}

/// Ordered registry of route handlers
pub struct HandlerRegistry {
    entries: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for a pattern
    pub fn register(
        &self,
        pattern: RoutePattern,
        handler: Arc<dyn RouteHandler>,
        scope: HandlerScope,
    ) -> RouteHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push(Registration {
            registered_at: id,
            pattern,
            handler,
            scope,
        });
        RouteHandle { id, scope }
    }

    /// Remove a registration; relative order of survivors is preserved
    pub fn unregister(&self, handle: &RouteHandle) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| !(e.registered_at == handle.id && e.scope == handle.scope));
        entries.len() != before
    }

    /// Remove all registrations belonging to a scope
    pub fn clear(&self, scope: HandlerScope) {
        self.entries.write().retain(|e| e.scope != scope);
    }

    /// Remove every registration
    pub fn clear_all(&self) {
        self.entries.write().clear();
    }

    /// Find the most-recently-registered entry matching the URL
    pub fn find_match(&self, url: &Url) -> Option<Registration> {
        self.entries
            .read()
            .iter()
            .rev()
            .find(|e| e.pattern.matches(url))
            .cloned()
    }

    /// Find the newest match within one scope only
    pub fn find_match_in_scope(&self, url: &Url, scope: HandlerScope) -> Option<Registration> {
        self.entries
            .read()
            .iter()
            .rev()
            .find(|e| e.scope == scope && e.pattern.matches(url))
            .cloned()
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
