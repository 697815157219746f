//! Background refresh loop.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Re-polls every source of a [`Config`] on a fixed interval.
pub(crate) struct RefreshScheduler {
    config: Config,
    interval: Duration,
}

impl RefreshScheduler {
    pub(crate) fn new(config: Config, interval: Duration) -> Self {
        Self { config, interval }
    }

    /// Spawns the loop. It runs until `cancel` fires, then closes every
    /// subscriber.
    pub(crate) fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting refresh loop with interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let closed = self.config.close();
                    info!(subscribers = closed, "Refresh loop shutting down");
                    break;
                }
                _ = timer.tick() => self.do_refresh().await,
            }
        }
    }

    async fn do_refresh(&self) {
        debug!("Starting scheduled refresh");

        match self.config.refresh().await {
            Ok(true) => debug!("Refresh published a new document"),
            Ok(false) => debug!("Refresh found no changes"),
            Err(e) => warn!(error = %e, "Refresh failed, keeping previous document"),
        }
    }
}
