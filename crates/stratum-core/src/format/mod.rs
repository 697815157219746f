//! Structural transformers that turn a file's text into canonical JSON bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub mod json;
pub mod yaml;

pub use json::JsonTransformer;
pub use yaml::YamlTransformer;

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Returns the file extensions associated with this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }

    /// Guesses the format from a file extension (without dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    /// Returns the transformer for this format.
    pub fn transformer(&self) -> Arc<dyn Transformer> {
        match self {
            ConfigFormat::Json => Arc::new(JsonTransformer),
            ConfigFormat::Yaml => Arc::new(YamlTransformer),
        }
    }
}

/// Converts raw (already decoded) bytes into JSON bytes.
pub trait Transformer: Send + Sync {
    /// Transforms the input into JSON.
    fn transform(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Maps format tags (lowercase file extensions) to transformers.
///
/// The table is handed to each file source when it is built, so two sources
/// can disagree on how to read the same extension. Unknown tags use the
/// fallback, which is JSON pass-through by default.
#[derive(Clone)]
pub struct TransformerTable {
    by_tag: HashMap<String, Arc<dyn Transformer>>,
    fallback: Arc<dyn Transformer>,
}

impl TransformerTable {
    /// Creates a table with no entries and a JSON fallback.
    pub fn empty() -> Self {
        Self {
            by_tag: HashMap::new(),
            fallback: Arc::new(JsonTransformer),
        }
    }

    /// Registers a transformer for a tag, replacing any previous one.
    pub fn with(mut self, tag: impl Into<String>, transformer: Arc<dyn Transformer>) -> Self {
        self.by_tag.insert(tag.into().to_lowercase(), transformer);
        self
    }

    /// Registers a format under every one of its extensions.
    pub fn with_format(self, format: ConfigFormat) -> Self {
        format
            .extensions()
            .iter()
            .fold(self, |table, ext| table.with(*ext, format.transformer()))
    }

    /// Replaces the fallback used for unknown tags.
    pub fn with_fallback(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.fallback = transformer;
        self
    }

    /// Returns the transformer for `tag`, or the fallback.
    pub fn get(&self, tag: &str) -> &dyn Transformer {
        self.by_tag
            .get(tag)
            .map(Arc::as_ref)
            .unwrap_or(self.fallback.as_ref())
    }

    /// Returns true if `tag` has its own entry.
    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }
}

impl Default for TransformerTable {
    fn default() -> Self {
        Self::empty()
            .with_format(ConfigFormat::Json)
            .with_format(ConfigFormat::Yaml)
    }
}

impl fmt::Debug for TransformerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.by_tag.keys().collect();
        tags.sort();
        f.debug_struct("TransformerTable").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Transformer for Upper {
        fn transform(&self, input: &[u8]) -> Result<Vec<u8>> {
            Ok(input.to_ascii_uppercase())
        }
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ConfigFormat::from_extension("YML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("toml"), None);
    }

    #[test]
    fn test_default_table() {
        let table = TransformerTable::default();

        assert!(table.contains("json"));
        assert!(table.contains("yaml"));
        assert!(table.contains("yml"));
        assert_eq!(
            table.get("yml").transform(b"a: 1").unwrap(),
            br#"{"a":1}"#.to_vec()
        );
    }

    #[test]
    fn test_unknown_tag_uses_fallback() {
        let table = TransformerTable::default();
        assert_eq!(table.get("conf").transform(b"{}").unwrap(), b"{}".to_vec());

        let table = table.with_fallback(Arc::new(Upper));
        assert_eq!(table.get("conf").transform(b"abc").unwrap(), b"ABC".to_vec());
    }

    #[test]
    fn test_custom_entry() {
        let table = TransformerTable::empty().with("txt", Arc::new(Upper));
        assert_eq!(table.get("txt").transform(b"x").unwrap(), b"X".to_vec());
    }
}
