//! Loader trait definition.

use std::sync::Arc;

use async_trait::async_trait;
use stratum_core::{Result, Snapshot};
use tokio_util::sync::CancellationToken;

use super::Decoder;

/// A named origin of configuration data.
///
/// `load` may be called any number of times, concurrently with a running
/// [`watch`](Loader::watch). Implementations keep the current snapshot behind
/// their own lock: `load` returns the cached snapshot when one exists and only
/// reads the origin when the cache is empty.
///
/// # Example
///
/// ```ignore
/// use stratum_sources::{Decoder, Loader};
///
/// struct Fixed(Arc<Snapshot>);
///
/// #[async_trait]
/// impl Loader for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     async fn load(&self) -> Result<Arc<Snapshot>> {
///         Ok(self.0.clone())
///     }
///
///     fn set_decoder(&mut self, _decoder: Arc<dyn Decoder>) {}
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// Returns the name of this source, used in logs and errors.
    fn name(&self) -> &str;

    /// Returns the current snapshot.
    ///
    /// # Errors
    ///
    /// - `StratumError::SourceUnavailable` if the origin cannot be read
    /// - `StratumError::Decode` if a format transformer rejects the payload
    async fn load(&self) -> Result<Arc<Snapshot>>;

    /// Attaches a decoder applied to raw bytes before any format transform.
    ///
    /// Sources without raw bytes accept the decoder and ignore it.
    fn set_decoder(&mut self, decoder: Arc<dyn Decoder>);

    /// Returns whether [`watch`](Loader::watch) does anything.
    fn supports_watch(&self) -> bool {
        false
    }

    /// Keeps the cached snapshot current until `cancel` fires.
    ///
    /// Watchers only replace the cache; they never notify anybody. The
    /// default implementation returns immediately.
    async fn watch(&self, cancel: CancellationToken) -> Result<()> {
        let _ = cancel;
        Ok(())
    }
}
