//! File-backed source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use stratum_core::{Result, Snapshot, StratumError, TransformerTable};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::source::{Decoder, Loader};

/// Reads configuration from a single file.
///
/// The format tag is the lowercase file extension. The bytes go through the
/// decoder (if any) and then through the transformer registered for the tag,
/// so every file reaches the merge engine as JSON.
pub struct FileSource {
    name: String,
    path: PathBuf,
    format: String,
    watch: bool,
    transformers: TransformerTable,
    decoder: Option<Arc<dyn Decoder>>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl FileSource {
    /// Creates a source for `path` with the default transformer table.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        Self {
            name: format!("file:{}", path.display()),
            path,
            format,
            watch: false,
            transformers: TransformerTable::default(),
            decoder: None,
            current: RwLock::new(None),
        }
    }

    /// Enables or disables watching the file for writes.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Replaces the transformer table.
    pub fn with_transformers(mut self, transformers: TransformerTable) -> Self {
        self.transformers = transformers;
        self
    }

    /// Returns the watched path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the format tag derived from the extension.
    pub fn format(&self) -> &str {
        &self.format
    }

    async fn read_file(&self) -> Result<Snapshot> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            StratumError::source_unavailable_with_cause(
                &self.name,
                format!("cannot read {}", self.path.display()),
                e,
            )
        })?;

        let raw = match &self.decoder {
            Some(decoder) => decoder.decode(&raw).into_bytes(),
            None => raw,
        };

        let data = self.transformers.get(&self.format).transform(&raw)?;
        Ok(Snapshot::new(data))
    }

    async fn reload(&self) {
        let snapshot = match self.read_file().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    source = %self.name,
                    error = %e,
                    "Failed to reload file, keeping previous snapshot"
                );
                return;
            },
        };

        let mut current = self.current.write();
        let changed = current
            .as_ref()
            .is_none_or(|cached| cached.checksum() != snapshot.checksum());
        if changed {
            debug!(source = %self.name, checksum = snapshot.checksum(), "File changed");
            *current = Some(Arc::new(snapshot));
        }
    }
}

#[async_trait]
impl Loader for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        let cached = self.current.read().clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(self.read_file().await?);
        *self.current.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn set_decoder(&mut self, decoder: Arc<dyn Decoder>) {
        self.decoder = Some(decoder);
    }

    fn supports_watch(&self) -> bool {
        self.watch
    }

    async fn watch(&self, cancel: CancellationToken) -> Result<()> {
        if !self.watch {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(16);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })
        .map_err(|e| {
            StratumError::source_unavailable_with_cause(&self.name, "cannot create file watcher", e)
        })?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                StratumError::source_unavailable_with_cause(
                    &self.name,
                    format!("cannot watch {}", self.path.display()),
                    e,
                )
            })?;

        info!(source = %self.name, "Watching file for changes");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) if matches!(event.kind, EventKind::Modify(_)) => self.reload().await,
                    Some(_) => {},
                    None => break,
                },
            }
        }

        debug!(source = %self.name, "File watch stopped");
        Ok(())
    }
}
