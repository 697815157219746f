//! Stratum Core - documents, snapshots and the merge engine
//!
//! This crate provides the building blocks shared by every Stratum source
//! and by the refresh orchestrator:
//!
//! - [`Snapshot`]: an immutable payload with a memoized checksum
//! - [`ConfigValue`] / [`ConfigMap`]: the document model
//! - [`merge`]: deep override merging of snapshots
//! - [`tree`]: flat `/`-delimited keys to nested documents
//! - [`Values`] / [`Value`]: path-addressed, typed reads with fallbacks
//! - [`format`]: per-extension transformers for file sources

pub mod config;
pub mod error;
pub mod format;
pub mod merge;
pub mod snapshot;
pub mod tree;
pub mod values;

pub use config::{ConfigMap, ConfigValue};
pub use error::{Result, StratumError};
pub use format::{ConfigFormat, Transformer, TransformerTable};
pub use merge::{JsonMerger, Merger, deep_merge};
pub use snapshot::Snapshot;
pub use values::{JsonReader, KeyPath, Reader, Value, Values};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
