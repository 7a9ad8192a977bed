//! Expiry Sweeper
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::SharedStore;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Handle onto a running sweeper.
///
/// [`Sweeper::stop`] consumes the handle, so the stop signal can only be sent
/// once and a stopped sweeper cannot be restarted. Dropping the handle
/// without stopping leaves the task running for the rest of the runtime.
#[derive(Debug)]
pub struct Sweeper {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Sends the stop signal and waits for the task to finish.
    pub async fn stop(self) {
        // The receiver only goes away once the task has ended.
        let _ = self.stop_tx.send(());

        if let Err(err) = self.handle.await {
            warn!("Sweeper task ended abnormally: {}", err);
        }
    }

    /// Whether the task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns the background task that sweeps expired entries out of `store`
/// every `interval`.
///
/// Each pass snapshots expired keys under the shared lock, then removes them
/// under the exclusive lock, skipping any key refreshed in between.
///
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let store = CacheStore::new(1000).shared();
/// let sweeper = spawn_sweeper(store.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// sweeper.stop().await;
/// ```
pub fn spawn_sweeper(store: SharedStore, interval: Duration) -> Sweeper {
    let period = interval.max(MIN_SWEEP_INTERVAL);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", period);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut detached = false;

        loop {
            tokio::select! {
                signal = &mut stop_rx, if !detached => match signal {
                    Ok(()) => break,
                    Err(_) => {
                        debug!("Sweeper handle dropped, running detached");
                        detached = true;
                    }
                },
                _ = ticker.tick() => sweep(&store),
            }
        }

        info!("Expiry sweeper stopped");
    });

    Sweeper { stop_tx, handle }
}

fn sweep(store: &SharedStore) {
    let expired = store.expired_keys();
    if expired.is_empty() {
        debug!("Sweep: no expired entries found");
        return;
    }

    let removed = store.remove_expired(&expired);
    info!(
        "Sweep: removed {} of {} expired entries",
        removed,
        expired.len()
    );
}
