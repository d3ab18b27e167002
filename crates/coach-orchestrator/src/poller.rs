//! Periodic scan that fires timeout-based triggers.

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::orchestrator::Orchestrator;

/// Polls every registered session on a fixed interval.
///
/// Without this, a fragment that never reaches a sentence boundary or the
/// word threshold would wait until more speech arrives.
pub struct CyclePoller {
    orchestrator: Orchestrator,
    shutdown: watch::Receiver<bool>,
}

impl CyclePoller {
    pub fn new(orchestrator: Orchestrator, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            orchestrator,
            shutdown,
        }
    }

    /// Run the polling loop until shutdown signal.
    pub async fn run(&mut self) {
        let poll_interval = self.orchestrator.config().poll_interval;
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            poll_interval_ms = poll_interval.as_millis(),
            "starting cycle poller"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = self.orchestrator.poll_sessions().await;
                    if started > 0 {
                        trace!(started, "poller started cycles");
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("poller received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!("cycle poller stopped");
    }
}
