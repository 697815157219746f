//! The orchestrator: startup, refresh and the query surface.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use stratum_core::{
    ConfigValue, JsonMerger, JsonReader, KeyPath, Merger, Reader, Result, Snapshot, Value, Values,
};
use stratum_sources::{Decoder, Loader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::subscription::Subscription;
use crate::sync::{RefreshScheduler, RefreshState};
use crate::watch::{WatchHandle, WatchOptions};

/// Where a [`Config`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Sources registered, nothing loaded yet.
    Uninitialized,
    /// Initial document published.
    Ready,
    /// Refresh loop and source watchers running.
    Watching,
    /// Watch cancelled and subscribers closed.
    Closed,
}

/// Everything guarded by the document lock.
struct Document {
    snapshots: Vec<Arc<Snapshot>>,
    values: Values,
    subscribers: Vec<mpsc::Sender<()>>,
    lifecycle: Lifecycle,
}

struct Shared {
    sources: Vec<Arc<dyn Loader>>,
    reader: Arc<dyn Reader>,
    merger: Arc<dyn Merger>,
    document: RwLock<Document>,
    state: RefreshState,
    watch: Mutex<Option<WatchHandle>>,
    /// Held across load, merge and swap so refresh cycles never interleave.
    cycle: tokio::sync::Mutex<()>,
}

/// A merged, live configuration document.
///
/// Cloning is cheap; every clone shares the same document, subscribers and
/// refresh state. All reads are synchronous and see either the previous or
/// the next document, never a mix.
#[derive(Clone)]
pub struct Config {
    shared: Arc<Shared>,
}

impl Config {
    /// Creates a new builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Returns the canonical JSON encoding of the current document.
    pub fn bytes(&self) -> Vec<u8> {
        self.shared.document.read().values.bytes()
    }

    /// Resolves a dotted path (or pre-split segments).
    pub fn get(&self, path: impl Into<KeyPath>) -> Value {
        self.shared.document.read().values.get(path)
    }

    /// Sets a value in the in-memory document only.
    ///
    /// The change is lost at the next refresh that publishes a new document.
    pub fn set(&self, value: impl Into<ConfigValue>, path: impl Into<KeyPath>) {
        self.shared.document.write().values.set(value, path);
    }

    /// Removes a value from the in-memory document only.
    pub fn del(&self, path: impl Into<KeyPath>) {
        self.shared.document.write().values.del(path);
    }

    /// Exports the current document as an untyped map.
    pub fn map(&self) -> IndexMap<String, ConfigValue> {
        self.shared.document.read().values.map()
    }

    /// Decodes the current document into a typed target.
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        self.shared.document.read().values.scan()
    }

    /// Returns a copy of the current document.
    pub fn values(&self) -> Values {
        self.shared.document.read().values.clone()
    }

    /// Registers a new subscriber.
    ///
    /// Each subscriber holds at most one pending notification. After the
    /// watch has been cancelled the returned subscription never fires and is
    /// never closed.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(1);
        self.shared.document.write().subscribers.push(tx);
        Subscription::new(rx)
    }

    /// Returns the current lifecycle stage.
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.document.read().lifecycle
    }

    /// Returns the refresh bookkeeping.
    pub fn state(&self) -> &RefreshState {
        &self.shared.state
    }

    /// Takes the handle of the tasks spawned by the builder's watch setting.
    pub fn take_watch_handle(&self) -> Option<WatchHandle> {
        self.shared.watch.lock().take()
    }

    /// Reloads every source and republishes the document if anything changed.
    ///
    /// Returns `Ok(true)` when a new document was swapped in and subscribers
    /// were notified.
    ///
    /// # Errors
    ///
    /// Any source or merge error. The previous document stays in place.
    pub async fn refresh(&self) -> Result<bool> {
        let result = self.try_refresh().await;
        match &result {
            Ok(true) => {},
            Ok(false) => self.shared.state.record_unchanged(),
            Err(e) => self.shared.state.record_failure(e.to_string()),
        }
        result
    }

    async fn try_refresh(&self) -> Result<bool> {
        let _cycle = self.shared.cycle.lock().await;
        let snapshots = self.load_all().await?;

        let changed = {
            let document = self.shared.document.read();
            checksums_differ(&document.snapshots, &snapshots)
        };
        if !changed {
            return Ok(false);
        }

        let (merged, values) = self.merge(&snapshots)?;

        {
            let mut document = self.shared.document.write();
            document.snapshots = snapshots;
            document.values = values;

            if document.lifecycle != Lifecycle::Closed {
                notify(&document.subscribers);
            }
        }
        self.shared.state.record_swap(merged.checksum());

        info!(
            checksum = merged.checksum(),
            generation = self.shared.state.generation(),
            "Configuration updated"
        );
        Ok(true)
    }

    async fn initialize(&self) -> Result<()> {
        let snapshots = self.load_all().await?;
        let (merged, values) = self.merge(&snapshots)?;

        {
            let mut document = self.shared.document.write();
            document.snapshots = snapshots;
            document.values = values;
            document.lifecycle = Lifecycle::Ready;
        }
        self.shared.state.record_swap(merged.checksum());

        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Arc<Snapshot>>> {
        let mut snapshots = Vec::with_capacity(self.shared.sources.len());
        for source in &self.shared.sources {
            let snapshot = source.load().await.inspect_err(|e| {
                warn!(source = source.name(), error = %e, "Failed to load source");
            })?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    fn merge(&self, snapshots: &[Arc<Snapshot>]) -> Result<(Snapshot, Values)> {
        let merged = self.shared.merger.merge(snapshots)?;
        let values = self.shared.reader.read(&merged)?;
        Ok((merged, values))
    }

    /// Spawns one watch task per watch-capable source plus the refresh loop.
    fn start_watch(&self, cancel: CancellationToken, options: WatchOptions) -> WatchHandle {
        self.shared.document.write().lifecycle = Lifecycle::Watching;

        let watchers = self
            .shared
            .sources
            .iter()
            .filter(|source| source.supports_watch())
            .map(|source| {
                let source = source.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if let Err(e) = source.watch(cancel).await {
                        warn!(source = source.name(), error = %e, "Source watch failed");
                    }
                })
            })
            .collect::<Vec<_>>();

        let refresh = RefreshScheduler::new(self.clone(), options.interval).start(cancel);

        info!(
            watchers = watchers.len(),
            interval = ?options.interval,
            "Watching configuration"
        );

        WatchHandle::new(refresh, watchers)
    }

    /// Closes every registered subscriber and returns how many there were.
    pub(crate) fn close(&self) -> usize {
        let mut document = self.shared.document.write();
        document.lifecycle = Lifecycle::Closed;
        let closed = document.subscribers.len();
        document.subscribers.clear();
        closed
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let document = self.shared.document.read();
        f.debug_struct("Config")
            .field("sources", &self.shared.sources.len())
            .field("lifecycle", &document.lifecycle)
            .field("subscribers", &document.subscribers.len())
            .finish()
    }
}

/// Positional comparison; a different length always counts as a change.
fn checksums_differ(previous: &[Arc<Snapshot>], current: &[Arc<Snapshot>]) -> bool {
    previous.len() != current.len()
        || previous
            .iter()
            .zip(current)
            .any(|(a, b)| a.checksum() != b.checksum())
}

fn notify(subscribers: &[mpsc::Sender<()>]) {
    let mut dropped = 0;
    for tx in subscribers {
        if tx.try_send(()).is_err() {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!(dropped, "Skipped subscribers with a pending or closed channel");
    }
}

/// Builder for [`Config`].
///
/// Sources are merged in registration order: a later source overrides an
/// earlier one.
pub struct ConfigBuilder {
    sources: Vec<Arc<dyn Loader>>,
    reader: Arc<dyn Reader>,
    merger: Arc<dyn Merger>,
    watch: Option<(CancellationToken, WatchOptions)>,
}

impl ConfigBuilder {
    /// Creates a builder with the JSON reader and merger.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            reader: Arc::new(JsonReader),
            merger: Arc::new(JsonMerger),
            watch: None,
        }
    }

    /// Appends a source.
    pub fn source(mut self, source: impl Loader + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Appends a source whose raw bytes go through `decoder` first.
    pub fn source_with_decoder(
        self,
        mut source: impl Loader + 'static,
        decoder: Arc<dyn Decoder>,
    ) -> Self {
        source.set_decoder(decoder);
        self.source(source)
    }

    /// Replaces the reader.
    pub fn reader(mut self, reader: impl Reader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Replaces the merger.
    pub fn merger(mut self, merger: impl Merger + 'static) -> Self {
        self.merger = Arc::new(merger);
        self
    }

    /// Enables watching until `cancel` fires. A zero `interval` means the
    /// default of 30 seconds.
    pub fn watch(mut self, cancel: CancellationToken, interval: Duration) -> Self {
        self.watch = Some((cancel, WatchOptions::new(interval)));
        self
    }

    /// Loads every source and publishes the first document.
    ///
    /// Must be called inside a Tokio runtime when watching is enabled.
    ///
    /// # Errors
    ///
    /// The first source or merge error. No partial document is ever built.
    pub async fn build(self) -> Result<Config> {
        let config = Config {
            shared: Arc::new(Shared {
                sources: self.sources,
                reader: self.reader,
                merger: self.merger,
                document: RwLock::new(Document {
                    snapshots: Vec::new(),
                    values: Values::default(),
                    subscribers: Vec::new(),
                    lifecycle: Lifecycle::Uninitialized,
                }),
                state: RefreshState::new(),
                watch: Mutex::new(None),
                cycle: tokio::sync::Mutex::new(()),
            }),
        };

        if let Err(e) = config.initialize().await {
            error!(error = %e, "Failed to build initial configuration");
            return Err(e);
        }
        info!(
            sources = config.shared.sources.len(),
            checksum = config.shared.state.checksum().unwrap_or_default(),
            "Configuration ready"
        );

        if let Some((cancel, options)) = self.watch {
            let handle = config.start_watch(cancel, options);
            *config.shared.watch.lock() = Some(handle);
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
