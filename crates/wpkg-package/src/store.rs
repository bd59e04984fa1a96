//! Per-package key-value stores.
//!
//! Preferences and the datastore share one implementation that notifies an
//! optional [`ModifiedSink`] whenever its contents actually change.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// Receives "document modified" notifications from package stores.
pub trait ModifiedSink: Send + Sync {
    /// Called once per effective store mutation.
    fn mark_modified(&self);
}

/// String map that reports effective mutations to a [`ModifiedSink`].
#[derive(Default, Clone)]
pub struct EntryStore {
    entries: HashMap<String, String>,
    sink: Option<Arc<dyn ModifiedSink>>,
}

impl fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryStore")
            .field("entries", &self.entries)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl EntryStore {
    /// Empty store without a sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or replace the modified sink.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn ModifiedSink>>) {
        self.sink = sink;
    }

    /// Insert or replace an entry.
    ///
    /// Empty keys and unchanged values are ignored. Returns whether the store
    /// changed.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        if self.entries.get(key).is_some_and(|v| v == value) {
            return false;
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        trace!(key, "store entry set");
        self.notify();
        true
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove an entry. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            trace!(key, "store entry removed");
            self.notify();
        }
        removed
    }

    /// Remove every entry. Returns whether the store was non-empty.
    pub fn clear(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        self.notify();
        true
    }

    /// Snapshot of all entries.
    #[must_use]
    pub fn all(&self) -> HashMap<String, String> {
        self.entries.clone()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify(&self) {
        if let Some(sink) = &self.sink {
            sink.mark_modified();
        }
    }
}

/// Package preferences. Missing keys read as `None`.
#[derive(Debug, Default, Clone)]
pub struct PreferenceStore(EntryStore);

impl PreferenceStore {
    /// Attach or replace the modified sink.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn ModifiedSink>>) {
        self.0.set_sink(sink);
    }

    /// See [`EntryStore::set`].
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        self.0.set(key, value)
    }

    /// Preference value, `None` when unset.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    /// See [`EntryStore::remove`].
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key)
    }

    /// See [`EntryStore::clear`].
    pub fn clear(&mut self) -> bool {
        self.0.clear()
    }

    /// All preferences.
    #[must_use]
    pub fn all(&self) -> HashMap<String, String> {
        self.0.all()
    }
}

/// Package datastore. Missing keys read as the empty string.
#[derive(Debug, Default, Clone)]
pub struct DatastoreStore(EntryStore);

impl DatastoreStore {
    /// Attach or replace the modified sink.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn ModifiedSink>>) {
        self.0.set_sink(sink);
    }

    /// See [`EntryStore::set`].
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        self.0.set(key, value)
    }

    /// Entry value, empty when unset.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).unwrap_or_default()
    }

    /// See [`EntryStore::remove`].
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key)
    }

    /// See [`EntryStore::clear`].
    pub fn clear(&mut self) -> bool {
        self.0.clear()
    }

    /// All entries.
    #[must_use]
    pub fn all(&self) -> HashMap<String, String> {
        self.0.all()
    }
}
