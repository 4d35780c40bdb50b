//! Test fixtures and mapping-function helpers.
//!
//! Provides a thread-safe stand-in for downstream storage and ready-made
//! mapping functions for common projection shapes.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use triedex_core::{MapFn, Message};
use triedex_trie::MemoryTrie;

/// A typed record used by scenario tests and demos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record category, e.g. "planet".
    pub kind: String,
    /// Record name, e.g. "earth".
    pub name: String,
}

/// Creates a [`Record`].
pub fn record(kind: &str, name: &str) -> Record {
    Record {
        kind: kind.into(),
        name: name.into(),
    }
}

/// Builds a trie pre-populated with the given key/value pairs, one version
/// per pair.
pub fn seeded_trie(entries: &[(&str, &[u8])]) -> MemoryTrie {
    let trie = MemoryTrie::new();
    for (key, value) in entries {
        trie.put(*key, value.to_vec());
    }
    trie
}

/// A thread-safe materialized view standing in for downstream storage.
///
/// Mapping functions populate it; assertions read it back. All operations
/// are idempotent, which matches the at-least-once delivery contract.
#[derive(Debug, Default)]
pub struct MaterializedView {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MaterializedView {
    /// Creates an empty shared view.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inserts or replaces an entry.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Removes an entry if present.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Number of entries in the view.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a copy of all entries.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }
}

/// Builds a mapping function maintaining a secondary index in `view`.
///
/// `derive` projects a trie key and value into a `(view_key, view_value)`
/// pair. Updates first remove the entry derived from `previous_value`, so
/// stale index entries disappear when the derived key changes; deletions
/// remove the entry derived from the deleted value.
pub fn secondary_index_map<V, F>(view: Arc<MaterializedView>, derive: F) -> MapFn<V>
where
    V: Clone + Send + 'static,
    F: Fn(&str, &V) -> (String, String) + Send + 'static,
{
    Box::new(move |batch: &[Message<V>]| {
        for message in batch {
            if let Some(previous) = &message.previous_value {
                let (stale_key, _) = derive(&message.key, previous);
                view.delete(&stale_key);
            }
            let (view_key, view_value) = derive(&message.key, &message.value);
            if message.delete {
                view.delete(&view_key);
            } else {
                view.put(view_key, view_value);
            }
        }
        Ok(())
    })
}

/// Builds a mapping function that appends every delivered message to `sink`.
pub fn collecting_map<V>(sink: Arc<Mutex<Vec<Message<V>>>>) -> MapFn<V>
where
    V: Clone + Send + 'static,
{
    Box::new(move |batch: &[Message<V>]| {
        sink.lock().extend_from_slice(batch);
        Ok(())
    })
}
