//! In-memory versioned trie for testing and demos.

use crate::entry::ChangeEntry;
use crate::error::{TrieError, TrieResult};
use crate::traits::{
    ChangeListener, DiffCursor, DiffOptions, DiffStart, Trie, TrieSnapshot, WatchToken,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;

/// One committed write in the trie's history.
///
/// `value == None` records a deletion. The version of the write at index `i`
/// is `i + 1`; version 0 is the empty trie.
#[derive(Debug, Clone)]
struct HistoryEntry {
    key: String,
    value: Option<Vec<u8>>,
    hidden: bool,
}

struct Watcher {
    token: u64,
    prefix: String,
    listener: ChangeListener,
}

#[derive(Default)]
struct History {
    writes: Vec<HistoryEntry>,
}

impl History {
    /// Latest value of `key` among writes committed at or before `version`.
    fn value_at(&self, key: &str, version: u64) -> Option<Vec<u8>> {
        self.writes[..version as usize]
            .iter()
            .rev()
            .find(|w| w.key == key)
            .and_then(|w| w.value.clone())
    }

    fn live_keys_at(&self, version: u64) -> u64 {
        let mut seen = HashSet::new();
        let mut live = 0u64;
        for write in self.writes[..version as usize].iter().rev() {
            if seen.insert(write.key.clone()) && write.value.is_some() {
                live += 1;
            }
        }
        live
    }
}

/// An append-only in-memory versioned trie.
///
/// Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral indexing pipelines that don't need persistence
///
/// Every `put`/`delete` commits a new version. Snapshots pin a version and
/// stay consistent while later writes land, because history is append-only.
///
/// # Thread Safety
///
/// The trie is thread-safe; clones share the same underlying history.
///
/// # Example
///
/// ```rust
/// use triedex_trie::{MemoryTrie, Trie};
///
/// let trie = MemoryTrie::new();
/// trie.put("earth", b"planet".to_vec());
/// assert_eq!(trie.version(), 1);
/// assert_eq!(trie.get("earth"), Some(b"planet".to_vec()));
/// ```
#[derive(Clone, Default)]
pub struct MemoryTrie {
    history: Arc<RwLock<History>>,
    watchers: Arc<Mutex<Vec<Watcher>>>,
    next_token: Arc<Mutex<u64>>,
}

impl MemoryTrie {
    /// Creates a new empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a write of `value` under `key`, returning the new version.
    pub fn put(&self, key: impl Into<String>, value: Vec<u8>) -> u64 {
        self.commit(key.into(), Some(value), false)
    }

    /// Commits a hidden write, excluded from diffs unless requested.
    pub fn put_hidden(&self, key: impl Into<String>, value: Vec<u8>) -> u64 {
        self.commit(key.into(), Some(value), true)
    }

    /// Commits a deletion of `key`, returning the new version.
    pub fn delete(&self, key: impl Into<String>) -> u64 {
        self.commit(key.into(), None, false)
    }

    /// Returns the latest value of `key`, if the key is live.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let history = self.history.read();
        let version = history.writes.len() as u64;
        history.value_at(key, version)
    }

    fn commit(&self, key: String, value: Option<Vec<u8>>, hidden: bool) -> u64 {
        let version = {
            let mut history = self.history.write();
            history.writes.push(HistoryEntry {
                key: key.clone(),
                value,
                hidden,
            });
            history.writes.len() as u64
        };
        // Notify with no locks held; a listener may immediately read the trie.
        let listeners: Vec<ChangeListener> = {
            let watchers = self.watchers.lock();
            watchers
                .iter()
                .filter(|w| key.starts_with(&w.prefix))
                .map(|w| Arc::clone(&w.listener))
                .collect()
        };
        for listener in listeners {
            listener();
        }
        version
    }
}

impl Trie for MemoryTrie {
    fn version(&self) -> u64 {
        self.history.read().writes.len() as u64
    }

    fn snapshot(&self) -> TrieResult<Box<dyn TrieSnapshot>> {
        let version = self.version();
        Ok(Box::new(MemorySnapshot {
            history: Arc::clone(&self.history),
            version,
        }))
    }

    fn snapshot_at(&self, version: u64) -> TrieResult<Box<dyn TrieSnapshot>> {
        let current = self.version();
        if version > current {
            return Err(TrieError::VersionOutOfRange {
                requested: version,
                current,
            });
        }
        Ok(Box::new(MemorySnapshot {
            history: Arc::clone(&self.history),
            version,
        }))
    }

    fn watch(&self, prefix: &str, listener: ChangeListener) -> WatchToken {
        let token = {
            let mut next = self.next_token.lock();
            *next += 1;
            *next
        };
        self.watchers.lock().push(Watcher {
            token,
            prefix: prefix.to_string(),
            listener,
        });
        WatchToken(token)
    }

    fn unwatch(&self, token: WatchToken) {
        self.watchers.lock().retain(|w| w.token != token.0);
    }
}

/// A snapshot of a [`MemoryTrie`] pinned at a version.
struct MemorySnapshot {
    history: Arc<RwLock<History>>,
    version: u64,
}

impl TrieSnapshot for MemorySnapshot {
    fn version(&self) -> u64 {
        self.version
    }

    fn len(&self) -> u64 {
        self.history.read().live_keys_at(self.version)
    }

    fn diff(
        &self,
        start: DiffStart,
        prefix: &str,
        options: &DiffOptions,
    ) -> TrieResult<Box<dyn DiffCursor>> {
        let from = match start {
            DiffStart::Version(v) => v,
            DiffStart::Checkpoint(bytes) => decode_checkpoint(&bytes)?,
        };
        if from > self.version {
            return Err(TrieError::VersionOutOfRange {
                requested: from,
                current: self.version,
            });
        }

        let history = self.history.read();
        let mut entries = Vec::new();
        for (index, write) in history.writes[from as usize..self.version as usize]
            .iter()
            .enumerate()
        {
            let version = from + index as u64 + 1;
            if !write.key.starts_with(prefix) {
                continue;
            }
            if write.hidden && !options.hidden {
                continue;
            }
            let before = history.value_at(&write.key, version - 1);
            let entry = match (&before, &write.value) {
                (None, Some(after)) => ChangeEntry::insert(&write.key, version, after.clone()),
                (Some(prev), Some(after)) => {
                    ChangeEntry::update(&write.key, version, prev.clone(), after.clone())
                }
                (Some(prev), None) => ChangeEntry::delete(&write.key, version, prev.clone()),
                // Deleting an absent key commits a version but changes nothing.
                (None, None) => continue,
            };
            entries.push(entry);
        }
        entries.reverse(); // consumed by pop() in version order

        Ok(Box::new(MemoryDiffCursor {
            entries,
            last_version: from,
        }))
    }
}

/// Cursor over a precomputed list of change entries.
struct MemoryDiffCursor {
    /// Remaining entries, highest version first.
    entries: Vec<ChangeEntry>,
    /// Version of the last yielded entry; the resumable position.
    last_version: u64,
}

impl DiffCursor for MemoryDiffCursor {
    fn next(&mut self) -> TrieResult<Option<ChangeEntry>> {
        let entry = self.entries.pop();
        if let Some(entry) = &entry {
            self.last_version = entry.version;
        }
        Ok(entry)
    }

    fn checkpoint(&self) -> TrieResult<Vec<u8>> {
        Ok(self.last_version.to_be_bytes().to_vec())
    }
}

fn decode_checkpoint(bytes: &[u8]) -> TrieResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| TrieError::invalid_checkpoint(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}
