//! Error types for the indexing engine.

use std::io;
use thiserror::Error;

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while driving an index run.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Persisted progress state is corrupt.
    ///
    /// Corruption is always fatal to the run; it is never silently treated
    /// as "no state".
    #[error("progress state corrupt: {message}")]
    StateCorrupt {
        /// Description of the corruption.
        message: String,
    },

    /// A diff entry carried neither a before nor an after side.
    #[error("change entry for key {key:?} has no before or after side")]
    EmptyChange {
        /// The key of the malformed entry.
        key: String,
    },

    /// The trie collaborator failed mid-run.
    ///
    /// The run aborts without persisting a new checkpoint; the last
    /// persisted state stays valid and the next run resumes from it.
    #[error("trie error: {0}")]
    Trie(#[from] triedex_trie::TrieError),

    /// A value could not be decoded by the configured codec.
    #[error("codec error: {0}")]
    Codec(#[from] triedex_codec::CodecError),

    /// Storing the progress state failed after the mapping function already
    /// ran for the batch. The batch will be redelivered on the next run.
    #[error("state persistence failed: {message}")]
    StatePersist {
        /// Description of the failure.
        message: String,
    },

    /// The mapping function reported a failure.
    #[error("mapping function failed: {message}")]
    Map {
        /// Description of the failure.
        message: String,
    },

    /// I/O error from a durable-state store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IndexError {
    /// Creates a state corruption error.
    pub fn state_corrupt(message: impl Into<String>) -> Self {
        Self::StateCorrupt {
            message: message.into(),
        }
    }

    /// Creates a state persistence error.
    pub fn state_persist(message: impl Into<String>) -> Self {
        Self::StatePersist {
            message: message.into(),
        }
    }

    /// Creates a mapping function error.
    pub fn map_failed(message: impl Into<String>) -> Self {
        Self::Map {
            message: message.into(),
        }
    }
}
