use crate::config::ConfigMap;
use crate::error::{Result, StratumError};
use crate::format::Transformer;

/// Re-encodes a YAML document as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlTransformer;

impl Transformer for YamlTransformer {
    fn transform(&self, input: &[u8]) -> Result<Vec<u8>> {
        let text = std::str::from_utf8(input)
            .map_err(|e| StratumError::decode_error_with_cause("yaml", "not valid UTF-8", e))?;
        ConfigMap::from_yaml(text)?.to_vec()
    }
}
