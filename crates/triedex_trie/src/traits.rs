//! The trie collaborator contract.
//!
//! These traits describe what an indexer consumes from a versioned trie:
//! snapshots pinned at a version, sequential diff cursors over a version
//! range, and change notifications for live indexing. The indexer never
//! implements them; storage engines do. [`crate::MemoryTrie`] is the
//! reference implementation used by tests and demos.

use crate::entry::ChangeEntry;
use crate::error::TrieResult;
use std::sync::Arc;

/// A change-notification listener registered through [`Trie::watch`].
///
/// Listeners are invoked after every committed write under the watched
/// prefix, on the committing thread. They must be cheap; heavy work belongs
/// behind a coalescing scheduler.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle identifying a registered watch listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(pub(crate) u64);

/// Where a diff cursor starts iterating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStart {
    /// Enumerate changes committed after this version (exclusive).
    Version(u64),
    /// Resume a prior cursor from an opaque checkpoint.
    ///
    /// A checkpoint is only valid against a snapshot at the same version,
    /// over the same range start, as the cursor that produced it.
    Checkpoint(Vec<u8>),
}

/// Options controlling diff iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Include entries marked hidden (internal bookkeeping keys).
    pub hidden: bool,
}

/// A sequential enumerator of changes within one snapshot's version range.
///
/// Cursors are consumed strictly sequentially; callers must never issue
/// concurrent pulls against the same cursor.
pub trait DiffCursor: Send {
    /// Yields the next change entry, or `None` once the range is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails mid-iteration.
    fn next(&mut self) -> TrieResult<Option<ChangeEntry>>;

    /// Returns an opaque position from which iteration can resume.
    ///
    /// Only meaningful mid-range; the bytes are owned by the trie
    /// implementation and must be treated as opaque by callers.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot describe its position.
    fn checkpoint(&self) -> TrieResult<Vec<u8>>;
}

/// An immutable view of the trie pinned at a specific version.
pub trait TrieSnapshot: Send {
    /// The version this snapshot is pinned at.
    fn version(&self) -> u64;

    /// The number of live keys visible in this snapshot.
    fn len(&self) -> u64;

    /// Returns true if the snapshot contains no live keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a diff cursor over changes in `(start, version()]` under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` carries an invalid checkpoint or the
    /// underlying store fails.
    fn diff(
        &self,
        start: DiffStart,
        prefix: &str,
        options: &DiffOptions,
    ) -> TrieResult<Box<dyn DiffCursor>>;
}

/// An append-only, versioned key-value trie.
///
/// Every committed write advances the version by one. Implementations must
/// be `Send + Sync`; an indexer and writers may touch the trie from
/// different threads.
pub trait Trie: Send + Sync {
    /// The trie's current version (number of committed writes).
    fn version(&self) -> u64;

    /// Opens a snapshot at the current version.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn snapshot(&self) -> TrieResult<Box<dyn TrieSnapshot>>;

    /// Opens a snapshot pinned at `version`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrieError::VersionOutOfRange`] if the trie has not
    /// reached `version`.
    fn snapshot_at(&self, version: u64) -> TrieResult<Box<dyn TrieSnapshot>>;

    /// Registers a listener fired after every committed write under `prefix`.
    fn watch(&self, prefix: &str, listener: ChangeListener) -> WatchToken;

    /// Removes a previously registered listener.
    fn unwatch(&self, token: WatchToken);

    /// Invokes `callback` once the trie is initialized.
    ///
    /// The default implementation calls back immediately, which is correct
    /// for tries that are ready as soon as they are constructed.
    fn ready(&self, callback: Box<dyn FnOnce() + Send>) {
        callback();
    }
}
