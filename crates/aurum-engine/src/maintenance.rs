//! Background sweep of expired cache entries.
//!
//! The sweep runs on its own tokio task at a fixed cadence, independent of
//! request traffic. Each tick is a single [`TtlCache::sweep_expired`] call,
//! so stopping the task can never leave the cache half swept.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;

/// Handle to a running maintenance loop.
///
/// Dropping the handle without calling [`stop`](Self::stop) also ends the
/// loop at its next wake-up, since the shutdown channel closes.
pub struct CacheMaintenance {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
    interval: Duration,
    sweeps: Arc<AtomicU64>,
    last_removed: Arc<AtomicUsize>,
}

impl CacheMaintenance {
    /// Start sweeping `cache` every `interval`. The first sweep runs one
    /// full interval after start.
    pub fn spawn<V>(cache: Arc<TtlCache<V>>, interval: Duration) -> Self
    where
        V: Clone + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let sweeps = Arc::new(AtomicU64::new(0));
        let last_removed = Arc::new(AtomicUsize::new(0));

        let task_sweeps = sweeps.clone();
        let task_last_removed = last_removed.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.sweep_expired();
                        task_sweeps.fetch_add(1, Ordering::Relaxed);
                        task_last_removed.store(removed, Ordering::Relaxed);

                        if removed > 0 {
                            info!("Cache sweep removed {} expired entries ({} remain)", removed, cache.len());
                        } else {
                            debug!("Cache sweep found no expired entries");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Cache maintenance loop shutting down");
                        break;
                    }
                }
            }
        });

        info!("Started cache maintenance every {:?}", interval);

        Self {
            shutdown_tx,
            handle,
            interval,
            sweeps,
            last_removed,
        }
    }

    /// Sweep cadence.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of sweeps completed so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Entries removed by the most recent sweep.
    pub fn last_removed(&self) -> usize {
        self.last_removed.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            warn!("Cache maintenance task ended abnormally: {}", e);
        }
    }
}
