//! Error types for Stratum.
//!
//! This module defines the error hierarchy shared by the merge engine,
//! the sources and the refresh orchestrator. All errors implement the
//! standard `std::error::Error` trait via `thiserror`.
//!
//! # Error Handling Philosophy
//!
//! - A source that cannot be read fails with [`StratumError::SourceUnavailable`].
//!   At startup this aborts construction; during a refresh tick the tick is
//!   skipped and the previous document stays in effect.
//! - A snapshot that cannot be decoded as structured data fails the whole
//!   merge cycle with [`StratumError::Decode`].
//! - Per-leaf and decryption failures never show up here: they are recovered
//!   locally by falling back to the raw input.
//!
//! # Example
//!
//! ```
//! use stratum_core::{Result, StratumError};
//!
//! fn read_origin(path: &str) -> Result<Vec<u8>> {
//!     if path.is_empty() {
//!         return Err(StratumError::source_unavailable("file", "empty path"));
//!     }
//!     Ok(Vec::new())
//! }
//!
//! assert!(read_origin("").unwrap_err().is_source_unavailable());
//! ```

use std::io;
use thiserror::Error;

/// Main error type for Stratum operations.
#[derive(Debug, Error)]
pub enum StratumError {
    /// The origin of a source could not be read.
    #[error("Source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        /// Name of the source that failed
        source_name: String,
        /// Description of what went wrong
        message: String,
        /// Underlying error
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Snapshot bytes could not be decoded as structured data.
    #[error("Failed to decode configuration from '{source_name}': {message}")]
    Decode {
        /// Where the undecodable bytes came from
        source_name: String,
        /// Description of the decode error
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Structured data could not be encoded back to bytes.
    #[error("Failed to encode configuration: {0}")]
    Encode(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StratumError {
    /// Creates a SourceUnavailable error without a cause.
    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a SourceUnavailable error with a cause.
    pub fn source_unavailable_with_cause<E>(
        source_name: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a Decode error without a cause.
    pub fn decode_error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a Decode error with a cause.
    pub fn decode_error_with_cause<E>(
        source_name: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            source_name: source_name.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates an Encode error.
    pub fn encode_error(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the origin of a source could not be read.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }

    /// Returns true if this is a decode error.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns true if a later refresh might succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::Io(_))
    }
}

/// Type alias for Results with StratumError.
pub type Result<T> = std::result::Result<T, StratumError>;
