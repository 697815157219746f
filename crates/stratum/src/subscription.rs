use tokio::sync::mpsc;
pub use tokio::sync::mpsc::error::TryRecvError;

/// Receiving end of change notifications.
///
/// A notification only means "re-read now": it carries no data, and several
/// changes that happen before the subscriber looks collapse into one.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<()>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Waits for the next change.
    ///
    /// Returns `false` once watching has been cancelled and the channel is
    /// closed.
    pub async fn changed(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Checks for a pending change without waiting.
    pub fn try_changed(&mut self) -> Result<(), TryRecvError> {
        self.rx.try_recv()
    }

    /// Returns true if the sending side has been closed.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}
