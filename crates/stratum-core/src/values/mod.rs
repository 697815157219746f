//! Path-addressed access to a merged configuration document.

pub mod parse;
mod path;
mod value;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

pub use path::KeyPath;
pub use value::Value;

use crate::config::ConfigValue;
use crate::error::{Result, StratumError};
use crate::snapshot::Snapshot;

/// Turns a merged snapshot into a [`Values`] document.
pub trait Reader: Send + Sync {
    /// Reads `snapshot` into a document.
    fn read(&self, snapshot: &Snapshot) -> Result<Values>;
}

/// Default reader for JSON snapshots.
///
/// Bytes that are not JSON are kept as a single string at the document root
/// instead of failing the read.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

impl Reader for JsonReader {
    fn read(&self, snapshot: &Snapshot) -> Result<Values> {
        let root = serde_json::from_slice::<ConfigValue>(snapshot.data()).unwrap_or_else(|_| {
            ConfigValue::String(String::from_utf8_lossy(snapshot.data()).into_owned())
        });
        Ok(Values::new(root))
    }
}

/// The decoded form of a merged document.
///
/// `set` and `del` only touch this in-memory copy; nothing is written back to
/// the sources, and the next successful refresh replaces the whole document.
///
/// # Example
///
/// ```
/// use stratum_core::{JsonReader, Reader, Snapshot};
///
/// let snapshot = Snapshot::from(r#"{"alert": {"enabled": "true", "retries": 3}}"#);
/// let mut values = JsonReader.read(&snapshot).unwrap();
///
/// assert!(values.get("alert.enabled").bool(false));
/// assert_eq!(values.get(["alert", "retries"]).int(0), 3);
///
/// values.set(5, "alert.retries");
/// assert_eq!(values.get("alert.retries").int(0), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Values {
    root: ConfigValue,
}

impl Values {
    /// Wraps a decoded document.
    pub fn new(root: ConfigValue) -> Self {
        Self { root }
    }

    /// Returns the root of the document.
    pub fn root(&self) -> &ConfigValue {
        &self.root
    }

    /// Returns the canonical JSON encoding of the document.
    pub fn bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.root).unwrap_or_default()
    }

    /// Resolves `path`; an absent path yields a null [`Value`].
    pub fn get(&self, path: impl Into<KeyPath>) -> Value {
        let path = path.into();
        self.root
            .get_path(path.segments())
            .cloned()
            .map(Value::new)
            .unwrap_or_default()
    }

    /// Stores `value` at `path`, creating intermediate objects as needed.
    ///
    /// Any non-object found along the path is replaced by an object. An
    /// empty path replaces the whole document.
    pub fn set(&mut self, value: impl Into<ConfigValue>, path: impl Into<KeyPath>) {
        let path = path.into();
        let value = value.into();

        let Some((last, parents)) = path.split_last() else {
            self.root = value;
            return;
        };

        let mut node = &mut self.root;
        for segment in parents {
            node = object_entry(node, segment);
        }
        if !node.is_object() {
            *node = ConfigValue::object();
        }
        if let ConfigValue::Object(map) = node {
            map.insert(last.clone(), value);
        }
    }

    /// Removes the value at `path`. An empty path clears the document.
    pub fn del(&mut self, path: impl Into<KeyPath>) {
        let path = path.into();

        let Some((last, parents)) = path.split_last() else {
            self.root = ConfigValue::object();
            return;
        };

        let mut node = &mut self.root;
        for segment in parents {
            node = match node {
                ConfigValue::Object(map) => match map.get_mut(segment) {
                    Some(child) => child,
                    None => return,
                },
                _ => return,
            };
        }
        if let ConfigValue::Object(map) = node {
            map.shift_remove(last);
        }
    }

    /// Exports the document as an untyped map.
    ///
    /// A document whose root is not an object exports as an empty map.
    pub fn map(&self) -> IndexMap<String, ConfigValue> {
        self.root.as_object().cloned().unwrap_or_default()
    }

    /// Decodes the whole document into a typed target.
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = serde_json::to_vec(&self.root)
            .map_err(|e| StratumError::encode_error(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StratumError::decode_error_with_cause("values", "scan failed", e))
    }
}

fn object_entry<'a>(node: &'a mut ConfigValue, key: &str) -> &'a mut ConfigValue {
    if !node.is_object() {
        *node = ConfigValue::object();
    }
    match node {
        ConfigValue::Object(map) => map.entry(key.to_string()).or_insert(ConfigValue::Null),
        other => other,
    }
}
