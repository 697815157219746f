use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::parse;
use crate::config::ConfigValue;
use crate::error::{Result, StratumError};

/// A handle over one subtree of a configuration document.
///
/// Every typed reader takes a default. The reader first tries the native
/// type, then parses the value's string form, and only then falls back to the
/// default. That way `"8080"` from a flag and `8080` from a JSON file read the
/// same. An absent path yields a null handle, for which every reader returns
/// its default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value(ConfigValue);

impl Value {
    /// Wraps a configuration value.
    pub fn new(value: ConfigValue) -> Self {
        Self(value)
    }

    /// Returns the underlying configuration value.
    pub fn as_config_value(&self) -> &ConfigValue {
        &self.0
    }

    /// Consumes the handle.
    pub fn into_inner(self) -> ConfigValue {
        self.0
    }

    /// Returns true if the path was absent or held `null`.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Reads a boolean, accepting `"true"`, `"1"`, `"f"` and the like.
    pub fn bool(&self, default: bool) -> bool {
        self.0
            .as_bool()
            .or_else(|| self.0.as_str().and_then(parse::parse_bool))
            .unwrap_or(default)
    }

    /// Reads an integer. A float counts only when it has no fractional part
    /// and fits in an `i64`.
    pub fn int(&self, default: i64) -> i64 {
        match &self.0 {
            ConfigValue::Integer(i) => *i,
            ConfigValue::Float(f) => integral(f.into_inner()).unwrap_or(default),
            ConfigValue::String(s) => parse::parse_int(s).unwrap_or(default),
            _ => default,
        }
    }

    /// Reads a string. Non-string values yield the default.
    pub fn string(&self, default: &str) -> String {
        self.0.as_str().unwrap_or(default).to_string()
    }

    /// Reads a float; integers widen.
    pub fn float64(&self, default: f64) -> f64 {
        self.0
            .as_f64()
            .or_else(|| self.0.as_str().and_then(parse::parse_float))
            .unwrap_or(default)
    }

    /// Reads a duration written as a string such as `"1m30s"`.
    pub fn duration(&self, default: Duration) -> Duration {
        self.0
            .as_str()
            .and_then(parse::parse_duration)
            .unwrap_or(default)
    }

    /// Reads a list of strings.
    ///
    /// A string is split on `,`; an array is accepted only if every element is
    /// a string.
    pub fn string_slice(&self, default: &[&str]) -> Vec<String> {
        match &self.0 {
            ConfigValue::String(s) => s.split(',').map(str::to_string).collect(),
            ConfigValue::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .unwrap_or_else(|| owned(default)),
            _ => owned(default),
        }
    }

    /// Reads an object as a flat string map, rendering each value as text.
    pub fn string_map(&self, default: HashMap<String, String>) -> HashMap<String, String> {
        match self.0.as_object() {
            Some(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.to_plain_string()))
                .collect(),
            None => default,
        }
    }

    /// Decodes the subtree into a typed target.
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = serde_json::to_vec(&self.0)
            .map_err(|e| StratumError::encode_error(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StratumError::decode_error_with_cause("value", "scan failed", e))
    }

    /// Returns the raw bytes of a string, or the JSON encoding of anything else.
    pub fn bytes(&self) -> Vec<u8> {
        match &self.0 {
            ConfigValue::String(s) => s.as_bytes().to_vec(),
            other => serde_json::to_vec(other).unwrap_or_default(),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        Self(value)
    }
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
