// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! In-memory mock store for stateful CRUD simulation
//!
//! Handler-owned keyed state shared across calls within one test scope.
//! Reads see committed mutations made by earlier matched requests; created
//! records get strictly increasing identifiers drawn from one store-wide
//! counter, never reused across deletes or collections. No built-in
//! cross-test isolation: create a fresh store per test.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// One named collection of records
#[derive(Debug, Default)]
struct Collection {
    /// Records in insertion order
    items: Vec<Value>,
}

impl Collection {
    fn position(&self, id: u64) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.get("id").and_then(Value::as_u64) == Some(id))
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    collections: HashMap<String, Collection>,
    /// Next identifier to issue, shared by all collections; never decremented
    next_id: u64,
}

/// Shared mutable state simulating backing resources across requests
#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record, injecting a fresh `id` field
    ///
    /// Returns the issued identifier and the stored record. Identifiers are
    /// unique across the whole store, not just within one collection.
    pub fn create(&self, collection: &str, mut value: Value) -> (u64, Value) {
        let mut inner = self.inner.write();

        inner.next_id += 1;
        let id = inner.next_id;

        if !value.is_object() {
            value = serde_json::json!({ "value": value });
        }
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_string(), Value::from(id));
        }

        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .items
            .push(value.clone());
        (id, value)
    }

    /// Snapshot of all records in a collection, insertion order
    pub fn list(&self, collection: &str) -> Vec<Value> {
        self.inner
            .read()
            .collections
            .get(collection)
            .map(|c| c.items.clone())
            .unwrap_or_default()
    }

    /// Get one record by identifier
    pub fn get(&self, collection: &str, id: u64) -> Option<Value> {
        let inner = self.inner.read();
        let entry = inner.collections.get(collection)?;
        entry.position(id).map(|i| entry.items[i].clone())
    }

    /// Replace a record by identifier, preserving its `id` field
    ///
    /// Returns the stored record, or `None` when the identifier does not
    /// exist (the caller maps this to a client-error response).
    pub fn update(&self, collection: &str, id: u64, mut value: Value) -> Option<Value> {
        let mut inner = self.inner.write();
        let entry = inner.collections.get_mut(collection)?;
        let position = entry.position(id)?;

        if !value.is_object() {
            value = serde_json::json!({ "value": value });
        }
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_string(), Value::from(id));
        }

        entry.items[position] = value.clone();
        Some(value)
    }

    /// Delete a record by identifier; false when it does not exist
    pub fn delete(&self, collection: &str, id: u64) -> bool {
        let mut inner = self.inner.write();
        let Some(entry) = inner.collections.get_mut(collection) else {
            return false;
        };
        match entry.position(id) {
            Some(position) => {
                entry.items.remove(position);
                true
            }
            None => false,
        }
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .read()
            .collections
            .get(collection)
            .map(|c| c.items.len())
            .unwrap_or(0)
    }

    /// Check if a collection has no records
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Remove all records from a collection; identifiers are not reset
    pub fn clear(&self, collection: &str) {
        if let Some(entry) = self.inner.write().collections.get_mut(collection) {
            entry.items.clear();
        }
    }
}
