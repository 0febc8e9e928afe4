//! # AdmSync Testkit
//!
//! Test utilities for AdmSync.
//!
//! This crate provides:
//! - [`MemoryStore`], an in-memory remote store with per-session
//!   transactions, history flags and failure injection
//! - A small interpreter for the statements sync scripts contain
//! - Fixture kinds, seeded stores and temporary definition directories
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use admsync_testkit::prelude::*;
//!
//! let store = seeded_store();
//! let sync = Synchronizer::new(SyncConfig::default(), store.session());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
mod mql;
mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::store::{MemorySession, MemoryStore, ObjectKey, StoredObject};
    pub use admsync_engine::{SyncConfig, Synchronizer, UpdateRequest};
}

pub use fixtures::*;
pub use generators::*;
pub use store::{MemorySession, MemoryStore, ObjectKey, StoredObject};
