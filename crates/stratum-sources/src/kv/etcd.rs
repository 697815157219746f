//! etcd adapter for [`KvClient`].

use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, EventType, GetOptions, WatchOptions};
use futures::StreamExt;
use stratum_core::tree::KeyValue;
use stratum_core::{Result, StratumError};
use tracing::info;

use super::{EventStream, KvClient, KvEvent, KvOptions};

const SOURCE: &str = "etcd";

/// A [`KvClient`] backed by an etcd v3 cluster.
#[derive(Clone)]
pub struct EtcdClient {
    client: Client,
    request_timeout: Duration,
}

impl EtcdClient {
    /// Connects to the endpoints in `options`.
    pub async fn connect(options: &KvOptions) -> Result<Self> {
        let mut connect = ConnectOptions::new().with_connect_timeout(options.dial_timeout);
        if let (Some(user), Some(password)) = (&options.username, &options.password) {
            connect = connect.with_user(user.clone(), password.clone());
        }

        let client = Client::connect(&options.endpoints, Some(connect))
            .await
            .map_err(|e| {
                StratumError::source_unavailable_with_cause(
                    SOURCE,
                    format!("cannot connect to {}", options.endpoints.join(",")),
                    e,
                )
            })?;

        info!(endpoints = ?options.endpoints, "Connected to etcd");

        Ok(Self {
            client,
            request_timeout: options.dial_timeout,
        })
    }
}

#[async_trait]
impl KvClient for EtcdClient {
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        let mut client = self.client.clone();
        let request = client.get(prefix, Some(GetOptions::new().with_prefix()));

        let response = tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|e| StratumError::source_unavailable_with_cause(SOURCE, "request timed out", e))?
            .map_err(|e| StratumError::source_unavailable_with_cause(SOURCE, "get failed", e))?;

        Ok(response
            .kvs()
            .iter()
            .map(|kv| KeyValue::new(String::from_utf8_lossy(kv.key()), kv.value().to_vec()))
            .collect())
    }

    async fn watch_prefix(&self, prefix: &str) -> Result<EventStream> {
        let mut client = self.client.clone();
        let (watcher, stream) = client
            .watch(prefix, Some(WatchOptions::new().with_prefix()))
            .await
            .map_err(|e| StratumError::source_unavailable_with_cause(SOURCE, "watch failed", e))?;

        let events = stream.map(move |response| {
            // The watch is cancelled when the watcher is dropped.
            let _watcher = &watcher;
            let response = response.map_err(|e| {
                StratumError::source_unavailable_with_cause(SOURCE, "watch stream failed", e)
            })?;

            Ok(response
                .events()
                .iter()
                .filter_map(|event| {
                    let kv = event.kv()?;
                    let key = String::from_utf8_lossy(kv.key()).into_owned();
                    Some(match event.event_type() {
                        EventType::Delete => KvEvent::delete(key),
                        EventType::Put => KvEvent::put(KeyValue::new(key, kv.value().to_vec())),
                    })
                })
                .collect())
        });

        Ok(events.boxed())
    }
}
