//! Client abstraction over a key-value store.

use async_trait::async_trait;
use futures::stream::BoxStream;
use stratum_core::Result;
use stratum_core::tree::{Action, KeyValue};

/// A stream of event batches, one batch per store revision.
pub type EventStream = BoxStream<'static, Result<Vec<KvEvent>>>;

/// A single change reported by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEvent {
    /// `Insert` for puts, `Delete` for removals.
    pub action: Action,
    /// The affected entry. Deletes carry an empty value.
    pub kv: KeyValue,
}

impl KvEvent {
    /// Creates a put event.
    pub fn put(kv: KeyValue) -> Self {
        Self {
            action: Action::Insert,
            kv,
        }
    }

    /// Creates a delete event for `key`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            action: Action::Delete,
            kv: KeyValue::new(key, Vec::new()),
        }
    }
}

/// The operations a [`KvSource`](super::KvSource) needs from a store.
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Returns every entry whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// `StratumError::SourceUnavailable` if the store cannot be reached.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>>;

    /// Subscribes to changes under `prefix`.
    ///
    /// The stream ends when the store closes the watch.
    async fn watch_prefix(&self, prefix: &str) -> Result<EventStream>;
}
