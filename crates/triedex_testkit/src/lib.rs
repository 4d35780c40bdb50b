//! # Triedex Testkit
//!
//! Test utilities for Triedex.
//!
//! This crate provides:
//! - Fixtures: a thread-safe materialized view and ready-made mapping
//!   functions
//! - Property-based test generators using proptest
//!
//! The workspace's cross-crate integration tests live in this crate's
//! `tests/` directory, since the testkit already depends on every other
//! crate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
