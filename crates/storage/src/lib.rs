//! Snapshot storage for Pensum.
//!
//! This crate provides a trait-based interface for loading curriculum and
//! enrollment snapshots, with a JSON file reference implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{SnapshotStore, StorageError, Result};
pub use json_storage::JsonSnapshotStore;
