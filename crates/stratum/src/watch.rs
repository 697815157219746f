//! Watch settings and task handles.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Default interval between refresh ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Settings for the background refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Interval between refresh ticks.
    pub interval: Duration,
}

impl WatchOptions {
    /// Creates options with `interval`; a zero interval means the default.
    pub fn new(interval: Duration) -> Self {
        if interval.is_zero() {
            Self::default()
        } else {
            Self { interval }
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Completion handles for the tasks spawned when watching starts.
///
/// Cancelling the token stops every task on its own; the handle only lets a
/// caller wait for that to happen. Dropping it detaches the tasks.
#[derive(Debug)]
pub struct WatchHandle {
    refresh: JoinHandle<()>,
    watchers: Vec<JoinHandle<()>>,
}

impl WatchHandle {
    pub(crate) fn new(refresh: JoinHandle<()>, watchers: Vec<JoinHandle<()>>) -> Self {
        Self { refresh, watchers }
    }

    /// Returns the number of source watch tasks.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Returns true once every task has exited.
    pub fn is_finished(&self) -> bool {
        self.refresh.is_finished() && self.watchers.iter().all(JoinHandle::is_finished)
    }

    /// Waits for the refresh loop and every source watch task to exit.
    pub async fn join(self) {
        let _ = self.refresh.await;
        for watcher in self.watchers {
            let _ = watcher.await;
        }
    }
}
