//! Raw byte decoders.

/// Result of running a [`Decoder`].
///
/// A decoder never fails outright: when it cannot make sense of its input it
/// hands the original bytes back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The input was decoded.
    Decoded(Vec<u8>),
    /// The input was left as is.
    Passthrough(Vec<u8>),
}

impl DecodeOutcome {
    /// Returns the bytes to use downstream, whichever branch was taken.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            DecodeOutcome::Decoded(bytes) | DecodeOutcome::Passthrough(bytes) => bytes,
        }
    }

    /// Returns true if the decoder transformed the input.
    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeOutcome::Decoded(_))
    }
}

/// A pure transform over the raw bytes of a source.
pub trait Decoder: Send + Sync {
    /// Decodes `input`.
    fn decode(&self, input: &[u8]) -> DecodeOutcome;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> DecodeOutcome + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> DecodeOutcome {
        self(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_bytes() {
        assert_eq!(DecodeOutcome::Decoded(b"a".to_vec()).into_bytes(), b"a");
        assert_eq!(DecodeOutcome::Passthrough(b"b".to_vec()).into_bytes(), b"b");
    }

    #[test]
    fn test_closure_decoder() {
        let reverse = |input: &[u8]| {
            let mut out = input.to_vec();
            out.reverse();
            DecodeOutcome::Decoded(out)
        };

        let outcome = reverse.decode(b"abc");
        assert!(outcome.is_decoded());
        assert_eq!(outcome.into_bytes(), b"cba");
    }
}
