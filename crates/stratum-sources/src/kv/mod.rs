//! Key-value store source.
//!
//! A [`KvSource`] reads every key under a prefix through a [`KvClient`] and
//! folds the flat keys into a nested document with [`stratum_core::tree`].
//! While watching, each batch of put/delete events is applied on top of the
//! last known document and replaces the cached snapshot.

mod client;
#[cfg(feature = "etcd")]
mod etcd;
mod options;

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::RwLock;
use stratum_core::tree::{self, KeyValue};
use stratum_core::{ConfigMap, Result, Snapshot, StratumError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use client::{EventStream, KvClient, KvEvent};
#[cfg(feature = "etcd")]
pub use etcd::EtcdClient;
pub use options::KvOptions;

use crate::source::{Decoder, Loader};

/// Configuration stored under a key prefix.
pub struct KvSource {
    name: String,
    prefix: String,
    client: Arc<dyn KvClient>,
    decoder: Option<Arc<dyn Decoder>>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl KvSource {
    /// Creates a source reading `prefix` through `client`.
    pub fn new(client: impl KvClient + 'static, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("kv:{prefix}"),
            prefix,
            client: Arc::new(client),
            decoder: None,
            current: RwLock::new(None),
        }
    }

    /// Connects to etcd and creates a source for `options.prefix`.
    #[cfg(feature = "etcd")]
    pub async fn etcd(options: KvOptions) -> Result<Self> {
        let client = EtcdClient::connect(&options).await?;
        Ok(Self::new(client, options.prefix).with_name("etcd"))
    }

    /// Overrides the name used in logs and errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = format!("{}:{}", name.into(), self.prefix);
        self
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn decode_value(&self, kv: KeyValue) -> KeyValue {
        match &self.decoder {
            Some(decoder) => KeyValue {
                value: decoder.decode(&kv.value).into_bytes(),
                key: kv.key,
            },
            None => kv,
        }
    }

    async fn read_prefix(&self) -> Result<Snapshot> {
        let entries = self.client.get_prefix(&self.prefix).await?;
        if entries.is_empty() {
            return Err(StratumError::source_unavailable(
                &self.name,
                format!("no keys under prefix '{}'", self.prefix),
            ));
        }

        let entries: Vec<KeyValue> = entries.into_iter().map(|kv| self.decode_value(kv)).collect();
        let data = tree::build(&entries, &self.prefix);
        Ok(Snapshot::new(data.to_vec()?))
    }

    fn apply_batch(&self, batch: Vec<KvEvent>) -> Result<()> {
        let previous = self.current.read().clone();
        let data = match &previous {
            Some(snapshot) => ConfigMap::from_slice(&self.name, snapshot.data())?,
            None => ConfigMap::new(),
        };

        let events: Vec<KvEvent> = batch
            .into_iter()
            .map(|event| KvEvent {
                action: event.action,
                kv: self.decode_value(event.kv),
            })
            .collect();
        let data = tree::apply(
            data,
            events.iter().map(|event| (event.action, &event.kv)),
            &self.prefix,
        );

        let snapshot = Arc::new(Snapshot::new(data.to_vec()?));
        debug!(
            source = %self.name,
            events = events.len(),
            checksum = snapshot.checksum(),
            "Applied key-value events"
        );
        *self.current.write() = Some(snapshot);
        Ok(())
    }
}

#[async_trait]
impl Loader for KvSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        let cached = self.current.read().clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(self.read_prefix().await?);
        *self.current.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn set_decoder(&mut self, decoder: Arc<dyn Decoder>) {
        self.decoder = Some(decoder);
    }

    fn supports_watch(&self) -> bool {
        true
    }

    async fn watch(&self, cancel: CancellationToken) -> Result<()> {
        let mut events = self.client.watch_prefix(&self.prefix).await?;
        info!(source = %self.name, "Watching key prefix for changes");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                batch = events.next() => match batch {
                    Some(Ok(batch)) => {
                        if let Err(e) = self.apply_batch(batch) {
                            warn!(
                                source = %self.name,
                                error = %e,
                                "Failed to apply key-value events"
                            );
                        }
                    },
                    Some(Err(e)) => {
                        warn!(source = %self.name, error = %e, "Key-value watch error");
                    },
                    None => break,
                },
            }
        }

        debug!(source = %self.name, "Key-value watch stopped");
        Ok(())
    }
}
