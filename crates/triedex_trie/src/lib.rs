//! # Triedex Trie
//!
//! The versioned-trie contract consumed by the Triedex indexing engine,
//! plus an in-memory reference implementation.
//!
//! A trie in this contract is an **append-only, versioned key-value
//! structure**: every committed write creates a new version. Indexers read
//! it through three narrow seams:
//!
//! - [`Trie`] - current version, snapshots, watch notifications
//! - [`TrieSnapshot`] - an immutable view pinned at a version
//! - [`DiffCursor`] - sequential enumeration of changes in a version range,
//!   resumable via opaque checkpoints
//!
//! Storage engines implement these traits; [`MemoryTrie`] is the reference
//! implementation used throughout the test suite and demos.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entry;
mod error;
mod memory;
mod traits;

pub use entry::ChangeEntry;
pub use error::{TrieError, TrieResult};
pub use memory::MemoryTrie;
pub use traits::{
    ChangeListener, DiffCursor, DiffOptions, DiffStart, Trie, TrieSnapshot, WatchToken,
};
