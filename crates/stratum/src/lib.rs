//! Stratum - layered runtime configuration with live reload
//!
//! A [`Config`] owns an ordered list of sources. At startup every source is
//! loaded and the snapshots are merged, later sources overriding earlier
//! ones. With watching enabled, a refresh loop re-polls the sources on an
//! interval, swaps the document when any checksum changed, and pings every
//! [`Subscription`] without ever blocking on a slow consumer.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use stratum::{CliSource, Config, FileSource};
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let config = Config::builder()
//!     .source(FileSource::new("app.yaml").with_watch(true))
//!     .source(CliSource::from_matches(&matches)?)
//!     .watch(token.clone(), Duration::from_secs(5))
//!     .build()
//!     .await?;
//!
//! let mut changes = config.subscribe();
//! while changes.changed().await {
//!     println!("alert? {}", config.get("alert.enabled").bool(false));
//! }
//! ```

mod config;
mod subscription;
pub mod sync;
mod watch;

pub use config::{Config, ConfigBuilder, Lifecycle};
pub use subscription::Subscription;
pub use sync::RefreshState;
pub use watch::{WatchHandle, WatchOptions};

pub use stratum_core::{
    ConfigMap, ConfigValue, JsonMerger, JsonReader, KeyPath, Merger, Reader, Result, Snapshot,
    StratumError, Value, Values,
};
#[cfg(feature = "etcd")]
pub use stratum_sources::EtcdClient;
pub use stratum_sources::{
    AesGcmHexDecoder, CliSource, DecodeOutcome, Decoder, FileSource, KvClient, KvOptions,
    KvSource, Loader, encrypt_to_hex,
};
