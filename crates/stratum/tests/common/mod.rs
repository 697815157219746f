#![allow(dead_code)]
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use stratum::{Decoder, Loader, Result, Snapshot, StratumError};
use tempfile::TempDir;
use tokio::sync::{Notify, oneshot};

/// A source whose snapshot the test can replace at any time.
pub struct StaticSource {
    name: String,
    current: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

/// Test-side handle to a [`StaticSource`].
#[derive(Clone)]
pub struct SourceHandle {
    current: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl StaticSource {
    pub fn new(name: &str, json: &str) -> (Self, SourceHandle) {
        let current = Arc::new(RwLock::new(Some(Arc::new(Snapshot::from(json)))));
        let source = Self {
            name: name.to_string(),
            current: current.clone(),
        };
        (source, SourceHandle { current })
    }
}

impl SourceHandle {
    /// Replaces the snapshot served by the source.
    pub fn set(&self, json: &str) {
        *self.current.write() = Some(Arc::new(Snapshot::from(json)));
    }

    /// Makes the source fail with `SourceUnavailable`.
    pub fn fail(&self) {
        *self.current.write() = None;
    }
}

#[async_trait]
impl Loader for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| StratumError::source_unavailable(&self.name, "origin is gone"))
    }

    fn set_decoder(&mut self, _decoder: Arc<dyn Decoder>) {}
}

/// Writes `content` into a file named `name` inside a fresh temp dir.
pub fn write_config(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    (dir, path)
}

/// A source whose next load can be held open until the test releases it.
pub struct GatedSource {
    current: Arc<RwLock<Arc<Snapshot>>>,
    gate: Arc<parking_lot::Mutex<Option<Gate>>>,
}

struct Gate {
    entered: Arc<Notify>,
    release: oneshot::Receiver<()>,
}

/// Test-side handle to a [`GatedSource`].
#[derive(Clone)]
pub struct GateHandle {
    current: Arc<RwLock<Arc<Snapshot>>>,
    gate: Arc<parking_lot::Mutex<Option<Gate>>>,
}

impl GatedSource {
    pub fn new(json: &str) -> (Self, GateHandle) {
        let current = Arc::new(RwLock::new(Arc::new(Snapshot::from(json))));
        let gate = Arc::new(parking_lot::Mutex::new(None));
        let source = Self {
            current: current.clone(),
            gate: gate.clone(),
        };
        (source, GateHandle { current, gate })
    }
}

impl GateHandle {
    pub fn set(&self, json: &str) {
        *self.current.write() = Arc::new(Snapshot::from(json));
    }

    /// Holds the next load after it has read its snapshot.
    ///
    /// The returned `Notify` fires once that load is parked; sending on the
    /// returned sender lets it finish.
    pub fn arm(&self) -> (Arc<Notify>, oneshot::Sender<()>) {
        let entered = Arc::new(Notify::new());
        let (tx, release) = oneshot::channel();
        *self.gate.lock() = Some(Gate {
            entered: entered.clone(),
            release,
        });
        (entered, tx)
    }
}

#[async_trait]
impl Loader for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        let snapshot = self.current.read().clone();
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            let _ = gate.release.await;
        }
        Ok(snapshot)
    }

    fn set_decoder(&mut self, _decoder: Arc<dyn Decoder>) {}
}
