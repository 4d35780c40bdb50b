//! Error types for trie collaborators.

use thiserror::Error;

/// Result type for trie operations.
pub type TrieResult<T> = Result<T, TrieError>;

/// Errors that can occur when reading a versioned trie.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// A diff checkpoint could not be interpreted.
    #[error("invalid diff checkpoint: {message}")]
    InvalidCheckpoint {
        /// Description of what was wrong with the checkpoint.
        message: String,
    },

    /// A snapshot was requested at a version the trie has not reached.
    #[error("version {requested} is beyond the current version {current}")]
    VersionOutOfRange {
        /// The version that was requested.
        requested: u64,
        /// The trie's current version.
        current: u64,
    },

    /// The underlying store failed.
    #[error("trie backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl TrieError {
    /// Creates an invalid checkpoint error.
    pub fn invalid_checkpoint(message: impl Into<String>) -> Self {
        Self::InvalidCheckpoint {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
