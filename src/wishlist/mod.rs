//! Persisted wishlist of saved books.
//!
//! The whole collection lives under one key as a JSON array, newest entry
//! first. Every persistence fault is logged and absorbed: reads degrade to an
//! empty wishlist and failed writes are dropped.

mod storage;

pub use storage::*;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::models::{BookRecord, WishlistEntry};

/// Key the collection is stored under.
pub const WISHLIST_KEY: &str = "bookfinder_wishlist";

pub struct WishlistStore {
    storage: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles within this process. Other
    // processes sharing the medium remain last-writer-wins.
    write_lock: Mutex<()>,
}

impl WishlistStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// All entries, most recently added first.
    pub fn list(&self) -> Vec<WishlistEntry> {
        let raw = match self.storage.get(WISHLIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read wishlist: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Discarding malformed wishlist data: {}", e);
                Vec::new()
            }
        }
    }

    /// Save a snapshot of `book` at the front, replacing any entry with the same id.
    pub fn add(&self, book: &BookRecord) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.list();
        entries.retain(|entry| entry.id != book.id);
        entries.insert(0, WishlistEntry::snapshot(book, Utc::now()));
        self.persist(&entries);
    }

    /// Remove the entry with `id`; absent ids are ignored.
    pub fn remove(&self, id: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() != before {
            self.persist(&entries);
        }
    }

    /// Single membership check. Prefer [`id_set`](Self::id_set) when checking many books.
    pub fn contains(&self, id: &str) -> bool {
        self.list().iter().any(|entry| entry.id == id)
    }

    pub fn id_set(&self) -> HashSet<String> {
        self.list().into_iter().map(|entry| entry.id).collect()
    }

    /// Ids in wishlist order.
    pub fn ids(&self) -> Vec<String> {
        self.list().into_iter().map(|entry| entry.id).collect()
    }

    fn persist(&self, entries: &[WishlistEntry]) {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to encode wishlist: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(WISHLIST_KEY, &raw) {
            tracing::warn!("Failed to save wishlist: {}", e);
        }
    }
}
