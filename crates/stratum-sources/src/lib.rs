//! Stratum Sources - origins that feed the merge engine
//!
//! Every origin implements [`Loader`]: it produces a [`Snapshot`] on demand,
//! may accept a [`Decoder`] for raw bytes, and may keep its cached snapshot
//! current through a background [`Loader::watch`] routine.
//!
//! - [`FileSource`]: a JSON or YAML file, optionally watched for writes
//! - [`CliSource`]: already-parsed command-line flags, fixed at construction
//! - [`KvSource`]: a key-value store prefix behind the [`KvClient`] trait
//! - [`AesGcmHexDecoder`]: hex-encoded AES-GCM payloads
//!
//! [`Snapshot`]: stratum_core::Snapshot

pub mod cli;
pub mod crypto;
pub mod file;
pub mod kv;
pub mod source;

pub use cli::CliSource;
pub use crypto::{AesGcmHexDecoder, encrypt_to_hex};
pub use file::FileSource;
#[cfg(feature = "etcd")]
pub use kv::EtcdClient;
pub use kv::{EventStream, KvClient, KvEvent, KvOptions, KvSource};
pub use source::{DecodeOutcome, Decoder, Loader};
