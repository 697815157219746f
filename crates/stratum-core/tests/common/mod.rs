#![allow(dead_code)]
use std::sync::Arc;

use stratum_core::{ConfigMap, JsonReader, Reader, Snapshot, Values};

/// Helper to create a snapshot from a JSON string slice.
pub fn snapshot(json: &str) -> Arc<Snapshot> {
    Arc::new(Snapshot::from(json))
}

/// Helper to decode a snapshot back into a ConfigMap.
/// Panics if the payload is invalid (intended for tests).
pub fn decode(snapshot: &Snapshot) -> ConfigMap {
    ConfigMap::from_slice("test", snapshot.data()).expect("Failed to decode test snapshot")
}

/// Helper to read a JSON string into a Values document.
pub fn values(json: &str) -> Values {
    JsonReader
        .read(&Snapshot::from(json))
        .expect("Failed to read test values")
}
