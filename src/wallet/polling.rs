//! Pending transaction poller
//!
//! Background task that keeps refreshing addresses with pending transactions
//! until the chain confirms them. Targets are recomputed on every registry
//! change and the task goes idle when nothing is pending.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::sync_ops::{addresses_to_poll, SyncCoordinator};

pub struct PendingTxPoller {
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PendingTxPoller {
    /// Spawn the polling task on the current tokio runtime
    pub fn start(coordinator: Arc<SyncCoordinator>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        log::info!("Starting pending transaction poller (every {:?})", period);
        let worker = tokio::spawn(poll_loop(coordinator, period, shutdown_rx));
        Self {
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Signal shutdown and wait for the task to finish its current batch
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    log::error!("Pending transaction poller panicked: {}", e);
                }
            }
            log::info!("Pending transaction poller stopped");
        }
    }
}

impl Drop for PendingTxPoller {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}

async fn poll_loop(
    coordinator: Arc<SyncCoordinator>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut registry_rx = coordinator.registry().subscribe();

    loop {
        let targets = {
            let snapshot = registry_rx.borrow_and_update();
            addresses_to_poll(&snapshot)
        };

        if targets.is_empty() {
            log::debug!("No pending transactions left, poller idle");
            tokio::select! {
                changed = registry_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
                _ = shutdown_rx.changed() => return,
            }
        }

        let hashes: Vec<&str> = targets.iter().map(|record| record.hash.as_str()).collect();
        log::debug!("Watching pending transactions of {:?}", hashes);

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    log::debug!("Checking if pending transactions are confirmed");
                    if let Err(e) = coordinator.fetch_account_data(targets.clone(), true).await {
                        log::debug!("Pending check skipped: {}", e);
                    }
                }
                changed = registry_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                _ = shutdown_rx.changed() => return,
            }
        }
    }
}
