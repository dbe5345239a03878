//! Periodic leaderboard polling.

use std::sync::Arc;
use std::time::Duration;

use mathlearn_core::LeaderboardEntry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::Backend;

pub const DEFAULT_LIMIT: usize = 10;

/// Latest leaderboard snapshot and when it was fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    pub entries: Vec<LeaderboardEntry>,
    /// Number of successful polls so far.
    pub generation: u64,
}

/// Polls the backend on a fixed interval. Dropping the poller stops it.
pub struct LeaderboardPoller {
    rx: watch::Receiver<LeaderboardSnapshot>,
    task: JoinHandle<()>,
}

impl LeaderboardPoller {
    /// Start polling immediately, then every `every`, which must be non-zero.
    pub fn spawn(backend: Arc<dyn Backend>, every: Duration, limit: usize) -> Self {
        let (tx, rx) = watch::channel(LeaderboardSnapshot::default());

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                match backend.leaderboard(limit).await {
                    Ok(entries) => {
                        tracing::debug!(count = entries.len(), "leaderboard refreshed");
                        tx.send_modify(|snapshot| {
                            snapshot.entries = entries;
                            snapshot.generation += 1;
                        });
                    }
                    // Keep showing the previous snapshot.
                    Err(e) => tracing::warn!(error = %e, "leaderboard poll failed"),
                }
            }
        });

        Self { rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<LeaderboardSnapshot> {
        self.rx.clone()
    }

    pub fn latest(&self) -> LeaderboardSnapshot {
        self.rx.borrow().clone()
    }
}

impl Drop for LeaderboardPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
