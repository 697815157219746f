//! Point-in-time configuration payloads.

use std::fmt;
use std::sync::OnceLock;

use sha2::{Digest, Sha256};

/// An immutable configuration payload loaded from one source.
///
/// The checksum is computed on first access and cached. A changed origin is
/// always represented by a new `Snapshot`; there is no mutation API.
///
/// # Example
///
/// ```
/// use stratum_core::Snapshot;
///
/// let a = Snapshot::new(br#"{"port":8080}"#.to_vec());
/// let b = Snapshot::new(br#"{"port":8080}"#.to_vec());
/// assert_eq!(a.checksum(), b.checksum());
/// ```
pub struct Snapshot {
    data: Vec<u8>,
    checksum: OnceLock<String>,
}

impl Snapshot {
    /// Creates a snapshot over the given bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            checksum: OnceLock::new(),
        }
    }

    /// Returns the raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the hex-encoded SHA-256 digest of the payload.
    pub fn checksum(&self) -> &str {
        self.checksum.get_or_init(|| checksum(&self.data))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.data.len())
            .field("checksum", &self.checksum())
            .finish()
    }
}

impl From<Vec<u8>> for Snapshot {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&str> for Snapshot {
    fn from(data: &str) -> Self {
        Self::new(data.as_bytes().to_vec())
    }
}

fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
