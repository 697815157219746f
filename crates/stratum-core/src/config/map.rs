use crate::config::value::ConfigValue;
use crate::error::{Result, StratumError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The root object of a configuration document.
///
/// Every snapshot that takes part in a merge must decode into one of these.
/// Keys keep insertion order so the canonical encoding of a document is
/// stable, which in turn keeps checksums stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigMap {
    #[serde(flatten)]
    inner: IndexMap<String, ConfigValue>,
}

impl ConfigMap {
    /// Creates a new empty configuration map.
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    /// Creates a ConfigMap from an existing IndexMap.
    pub fn from_inner(inner: IndexMap<String, ConfigValue>) -> Self {
        Self { inner }
    }

    /// Returns a mutable reference to the internal map.
    pub fn as_inner_mut(&mut self) -> &mut IndexMap<String, ConfigValue> {
        &mut self.inner
    }

    /// Consumes the map, returning the internal IndexMap.
    pub fn into_inner(self) -> IndexMap<String, ConfigValue> {
        self.inner
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Inserts a key-value pair into the map.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Retrieves a value by key, supporting dot notation for nested access.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        if path.is_empty() {
            return None;
        }

        if !path.contains('.') {
            return self.inner.get(path);
        }

        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current_value = self.inner.get(first)?;

        for part in parts {
            current_value = current_value.as_object()?.get(part)?;
        }

        Some(current_value)
    }

    /// Decodes a JSON payload into a map.
    ///
    /// An empty payload or a JSON `null` yields an empty map. Any other
    /// non-object payload is a decode error.
    pub fn from_slice(source_name: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let value: ConfigValue = serde_json::from_slice(bytes).map_err(|e| {
            StratumError::decode_error_with_cause(source_name, "invalid JSON payload", e)
        })?;

        match value {
            ConfigValue::Object(inner) => Ok(Self { inner }),
            ConfigValue::Null => Ok(Self::new()),
            other => Err(StratumError::decode_error(
                source_name,
                format!("expected an object at the document root, got {}", kind(&other)),
            )),
        }
    }

    /// Parses a JSON string into a ConfigMap.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice("json", json.as_bytes())
    }

    /// Serializes the map to compact JSON bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StratumError::encode_error(e.to_string()))
    }

    /// Parses a YAML string into a ConfigMap.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str::<Option<ConfigMap>>(yaml)
            .map(Option::unwrap_or_default)
            .map_err(|e| StratumError::decode_error_with_cause("yaml", "invalid YAML payload", e))
    }
}

impl From<IndexMap<String, ConfigValue>> for ConfigMap {
    fn from(map: IndexMap<String, ConfigValue>) -> Self {
        ConfigMap { inner: map }
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Object(map.inner)
    }
}

fn kind(value: &ConfigValue) -> &'static str {
    match value {
        ConfigValue::Null => "null",
        ConfigValue::Bool(_) => "a boolean",
        ConfigValue::Integer(_) | ConfigValue::Float(_) => "a number",
        ConfigValue::String(_) => "a string",
        ConfigValue::Array(_) => "an array",
        ConfigValue::Object(_) => "an object",
    }
}
