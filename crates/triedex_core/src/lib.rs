//! # Triedex Core
//!
//! A resumable, checkpointed indexing engine over append-only, versioned
//! key-value tries.
//!
//! The engine consumes a trie's change history incrementally and hands every
//! observed change (put/delete) to a user mapping function, which projects
//! it into arbitrary downstream storage: a secondary index, a derived table,
//! a notification stream. Guarantees:
//!
//! - every change is seen in version order, at least once; none is skipped
//! - progress survives restarts via a small durable checkpoint
//! - concurrent triggers coalesce; at most one run is active per indexer
//! - memory stays bounded by the configured batch size, independent of how
//!   far behind the indexer is
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use triedex_core::Indexer;
//! use triedex_trie::MemoryTrie;
//!
//! let trie = MemoryTrie::new();
//! trie.put("earth", b"planet".to_vec());
//!
//! let indexer = Indexer::with_defaults(
//!     Arc::new(trie),
//!     Box::new(|batch| {
//!         for message in batch {
//!             // project into downstream storage
//!             let _ = (&message.key, &message.value, message.delete);
//!         }
//!         Ok(())
//!     }),
//! );
//! indexer.run()?;
//! # Ok::<(), triedex_core::IndexError>(())
//! ```
//!
//! Delivery is **at-least-once**: a batch whose mapping-function call
//! completed but whose checkpoint did not persist is redelivered after a
//! restart. Mapping functions must be idempotent with respect to
//! redelivery.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod consumer;
mod error;
mod events;
mod indexer;
mod options;
mod state;
mod state_store;
mod transform;

pub use batch::MapFn;
pub use error::{IndexError, IndexResult};
pub use events::IndexEvent;
pub use indexer::{Indexer, IndexerBuilder, RunPhase};
pub use options::{IndexerOptions, DEFAULT_BATCH_SIZE};
pub use state::ProgressState;
pub use state_store::{FileStateStore, MemoryStateStore, StateStore};
pub use transform::{transform_entry, Message};
