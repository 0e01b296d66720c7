//! # LightSeq Testkit
//!
//! Test utilities for lightseq.
//!
//! This crate provides:
//! - Document fixtures built from JSON literals
//! - Typed sample tables and temporary snapshot files
//! - Property-based test generators using proptest
//! - An in-memory document store that serves the apply-operations RPC
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lightseq_testkit::prelude::*;
//!
//! let store = Arc::new(MemoryDocumentStore::new());
//! let sync = TableSync::<DocumentModel<JsonObject>, _>::new(
//!     TableName::Playlists,
//!     SyncConfig::default(),
//!     store.clone(),
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::store::*;
}

pub use fixtures::*;
pub use generators::*;
pub use store::*;
