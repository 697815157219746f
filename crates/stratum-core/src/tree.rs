//! Builds nested documents out of flat, `/`-delimited keys.
//!
//! Key-value stores hand back a flat list such as `/app/db/host = "x"`.
//! This module turns such lists into the same nested [`ConfigMap`] shape every
//! other source produces, both in bulk (initial fetch) and incrementally
//! (watch events applied on top of the last known document).

use indexmap::IndexMap;

use crate::config::{ConfigMap, ConfigValue};

/// What to do with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bulk construction.
    Put,
    /// Incremental create or update.
    Insert,
    /// Incremental removal.
    Delete,
}

/// One raw entry from a key-value origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Full key, including any prefix.
    pub key: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl KeyValue {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result of decoding a single leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// The bytes were valid JSON.
    Structured(ConfigValue),
    /// The bytes were kept as a plain string.
    Raw(String),
}

impl Leaf {
    /// Decodes raw bytes, falling back to the string form.
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<ConfigValue>(bytes) {
            Ok(value) => Leaf::Structured(value),
            Err(_) => Leaf::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Returns the value to store in the tree.
    pub fn into_value(self) -> ConfigValue {
        match self {
            Leaf::Structured(value) => value,
            Leaf::Raw(raw) => ConfigValue::String(raw),
        }
    }
}

/// Builds a document from a full prefix scan.
pub fn build<'a, I>(entries: I, strip_prefix: &str) -> ConfigMap
where
    I: IntoIterator<Item = &'a KeyValue>,
{
    entries.into_iter().fold(ConfigMap::new(), |data, kv| {
        update(data, kv, Action::Put, strip_prefix)
    })
}

/// Applies watch events, in order, on top of an existing document.
pub fn apply<'a, I>(data: ConfigMap, events: I, strip_prefix: &str) -> ConfigMap
where
    I: IntoIterator<Item = (Action, &'a KeyValue)>,
{
    events
        .into_iter()
        .fold(data, |data, (action, kv)| update(data, kv, action, strip_prefix))
}

/// Applies a single entry to `data` and returns the resulting document.
pub fn update(mut data: ConfigMap, kv: &KeyValue, action: Action, strip_prefix: &str) -> ConfigMap {
    let key = kv.key.strip_prefix(strip_prefix).unwrap_or(&kv.key);
    let key = key.strip_prefix('/').unwrap_or(key);

    if !key.contains('/') {
        return update_root(data, key, kv, action);
    }

    let segments: Vec<&str> = key.split('/').collect();
    if let Some((last, parents)) = segments.split_last() {
        let leaf = match action {
            Action::Delete => None,
            Action::Put | Action::Insert => Some(Leaf::decode(&kv.value).into_value()),
        };
        write_path(data.as_inner_mut(), parents, last, leaf);
    }

    data
}

/// Walks `parents`, turning every non-object on the way into an empty
/// object, then stores `leaf` under `last` (or removes `last` when `None`).
fn write_path(
    level: &mut IndexMap<String, ConfigValue>,
    parents: &[&str],
    last: &str,
    leaf: Option<ConfigValue>,
) {
    let Some((head, rest)) = parents.split_first() else {
        match leaf {
            Some(value) => {
                level.insert(last.to_string(), value);
            },
            None => {
                level.shift_remove(last);
            },
        }
        return;
    };

    let slot = level
        .entry((*head).to_string())
        .or_insert_with(ConfigValue::object);
    if let ConfigValue::Object(map) = slot {
        write_path(map, rest, last, leaf);
    } else {
        let mut map = IndexMap::new();
        write_path(&mut map, rest, last, leaf);
        *slot = ConfigValue::Object(map);
    }
}

fn update_root(mut data: ConfigMap, key: &str, kv: &KeyValue, action: Action) -> ConfigMap {
    match (action, key.is_empty()) {
        (Action::Delete, true) => ConfigMap::new(),
        (Action::Delete, false) => {
            data.as_inner_mut().shift_remove(key);
            data
        },
        (_, true) => match Leaf::decode(&kv.value).into_value() {
            ConfigValue::Object(map) => ConfigMap::from_inner(map),
            _ => data,
        },
        (_, false) => {
            data.insert(key, Leaf::decode(&kv.value).into_value());
            data
        },
    }
}
