use crate::error::Result;
use crate::format::Transformer;

/// Passes JSON through untouched; the merge engine validates it later.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTransformer;

impl Transformer for JsonTransformer {
    fn transform(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}
