//! In-memory document collection.
//!
//! Documents live in a `BTreeMap` keyed by ID. Deletion is lazy: a deleted
//! document leaves a tombstone that keeps its last indexed fields, so range
//! scans keep returning it as a non-existent snapshot until [`MemoryStore::compact`]
//! runs. This mirrors a secondary geohash index that lags behind the
//! primary records.

use super::{AsyncDocumentStore, DocumentStore, StoreResult};
use crate::query::Query;
use crate::types::{Document, DocumentSnapshot};
use async_trait::async_trait;
use log::trace;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Entry {
    fields: Map<String, Value>,
    deleted: bool,
}

/// Collection statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    /// Documents that currently exist
    pub live_count: usize,
    /// Deleted documents still visible to scans
    pub tombstone_count: usize,
    /// Queries executed since creation
    pub queries_run: u64,
}

/// Thread-safe in-memory collection implementing both store traits.
///
/// # Examples
///
/// ```rust
/// use geoquery::{Document, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.insert(Document::from_value("a", json!({ "geohash": "u0vqhv9eg" }))?);
/// assert_eq!(store.len(), 1);
///
/// store.delete("a");
/// assert_eq!(store.len(), 0);
/// assert_eq!(store.stats().tombstone_count, 1);
/// # Ok::<(), geoquery::GeoQueryError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Entry>>,
    queries_run: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `documents`.
    pub fn with_documents<I: IntoIterator<Item = Document>>(documents: I) -> Self {
        let store = Self::new();
        for document in documents {
            store.insert(document);
        }
        store
    }

    /// Insert or replace a document, returning the previous live version.
    pub fn insert(&self, document: Document) -> Option<Document> {
        let id = document.id().to_string();
        let entry = Entry {
            fields: document.into_fields(),
            deleted: false,
        };

        let previous = self.entries.write().insert(id.clone(), entry)?;
        if previous.deleted {
            None
        } else {
            Some(Document::new(id, previous.fields))
        }
    }

    /// Insert a document under a freshly generated ID and return the ID.
    pub fn add(&self, fields: Map<String, Value>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert(Document::new(id.clone(), fields));
        id
    }

    /// Fetch a live document by ID.
    pub fn get(&self, id: &str) -> Option<Document> {
        let entries = self.entries.read();
        let entry = entries.get(id).filter(|entry| !entry.deleted)?;
        Some(Document::new(id, entry.fields.clone()))
    }

    /// Delete a document, leaving a tombstone for scans. Returns `true` if it existed.
    pub fn delete(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(id) {
            Some(entry) if !entry.deleted => {
                entry.deleted = true;
                true
            }
            _ => false,
        }
    }

    /// Drop all tombstones, returning how many were removed.
    pub fn compact(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.deleted);
        before - entries.len()
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.entries.read().values().filter(|e| !e.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let entries = self.entries.read();
        let tombstone_count = entries.values().filter(|e| e.deleted).count();

        MemoryStoreStats {
            live_count: entries.len() - tombstone_count,
            tombstone_count,
            queries_run: self.queries_run.load(Ordering::Relaxed),
        }
    }

    fn execute(&self, query: &Query) -> Vec<DocumentSnapshot> {
        self.queries_run.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read();

        // Documents missing an ordering field are not part of an ordered scan.
        let mut matched: Vec<(&String, &Entry)> = entries
            .iter()
            .filter(|(_, entry)| query.matches(&entry.fields))
            .filter(|(_, entry)| {
                query
                    .orders()
                    .iter()
                    .all(|order| entry.fields.contains_key(&order.field))
            })
            .collect();

        // Stable sort: ties keep ID order.
        matched.sort_by(|(_, a), (_, b)| query.compare(&a.fields, &b.fields));

        let limit = query.max_results().unwrap_or(usize::MAX);
        let snapshots: Vec<DocumentSnapshot> = matched
            .into_iter()
            .take(limit)
            .map(|(id, entry)| {
                if entry.deleted {
                    DocumentSnapshot::missing(id.clone())
                } else {
                    DocumentSnapshot::found(Document::new(id.clone(), entry.fields.clone()))
                }
            })
            .collect();

        trace!("memory store query matched {} snapshots", snapshots.len());
        snapshots
    }
}

impl DocumentStore for MemoryStore {
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(self.execute(query))
    }
}

#[async_trait]
impl AsyncDocumentStore for MemoryStore {
    async fn run_query_async(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(self.execute(query))
    }
}
