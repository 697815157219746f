#![allow(dead_code)]
use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use parking_lot::Mutex;
use stratum_core::tree::KeyValue;
use stratum_core::{ConfigMap, Result, Snapshot, StratumError};
use stratum_sources::{EventStream, KvClient, KvEvent};
use tempfile::TempDir;

/// In-memory key-value client.
///
/// `get_prefix` serves the seeded entries; `watch_prefix` hands out the
/// receiving end of the channel returned by [`MockKv::new`].
pub struct MockKv {
    entries: Vec<KeyValue>,
    events: Mutex<Option<mpsc::UnboundedReceiver<Result<Vec<KvEvent>>>>>,
    reachable: bool,
}

impl MockKv {
    pub fn new(entries: Vec<KeyValue>) -> (Self, mpsc::UnboundedSender<Result<Vec<KvEvent>>>) {
        let (tx, rx) = mpsc::unbounded();
        let client = Self {
            entries,
            events: Mutex::new(Some(rx)),
            reachable: true,
        };
        (client, tx)
    }

    pub fn unreachable() -> Self {
        Self {
            entries: Vec::new(),
            events: Mutex::new(None),
            reachable: false,
        }
    }
}

#[async_trait]
impl KvClient for MockKv {
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        if !self.reachable {
            return Err(StratumError::source_unavailable("mock", "connection refused"));
        }
        Ok(self
            .entries
            .iter()
            .filter(|kv| kv.key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn watch_prefix(&self, _prefix: &str) -> Result<EventStream> {
        let rx = self
            .events
            .lock()
            .take()
            .ok_or_else(|| StratumError::source_unavailable("mock", "watch already taken"))?;
        Ok(rx.boxed())
    }
}

/// Writes `content` into a file named `name` inside a fresh temp dir.
pub fn write_config(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    (dir, path)
}

/// Decodes a snapshot into a map. Panics on invalid payloads.
pub fn decode(snapshot: &Snapshot) -> ConfigMap {
    ConfigMap::from_slice("test", snapshot.data()).expect("Failed to decode snapshot")
}
