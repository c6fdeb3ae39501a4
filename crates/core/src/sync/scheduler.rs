//! Background reconciliation loop with adaptive polling.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::sync::engine::SyncEngine;

/// Base polling cadence in seconds.
pub const POLL_BASE_INTERVAL_SECS: u64 = 30;

/// Adaptive polling delay: the base interval, backed off geometrically on
/// repeated errors (2x, 4x, then capped at 6x).
pub fn next_delay(error_count: u32) -> Duration {
    let multiplier = match error_count {
        0 => 1,
        1 => 2,
        2 => 4,
        _ => 6,
    };
    Duration::from_secs(POLL_BASE_INTERVAL_SECS * multiplier)
}

/// Runtime observability signals gating the polling loop. Evaluated before
/// each scheduling decision: never poll when the consumer cannot observe the
/// result.
pub trait RuntimeSignal: Send + Sync {
    fn is_online(&self) -> bool;
    fn is_foreground(&self) -> bool;
}

/// Cancellable background task that runs full syncs on an adaptive interval,
/// pausing entirely while offline or backgrounded and resuming immediately on
/// regain.
pub struct SyncRunner {
    engine: Arc<SyncEngine>,
    signal: Arc<dyn RuntimeSignal>,
    wake: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncRunner {
    pub fn new(engine: Arc<SyncEngine>, signal: Arc<dyn RuntimeSignal>) -> Self {
        Self {
            engine,
            signal,
            wake: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

    /// Start the loop if it is not already running.
    pub async fn start(&self) {
        let mut guard = self.task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            guard.take();
        }

        let engine = Arc::clone(&self.engine);
        let signal = Arc::clone(&self.signal);
        let wake = Arc::clone(&self.wake);
        let handle = tokio::spawn(async move {
            let mut error_count: u32 = 0;
            loop {
                if !signal.is_online() || !signal.is_foreground() {
                    debug!("[Sync] Runner paused (offline or backgrounded)");
                    wake.notified().await;
                    continue;
                }

                match engine.sync_all().await {
                    Ok(report) if report.success() => error_count = 0,
                    Ok(report) => {
                        debug!("[Sync] Runner cycle skipped or failed: {:?}", report.status);
                        error_count = error_count.saturating_add(1);
                    }
                    Err(err) => {
                        warn!("[Sync] Runner cycle hit a storage error: {}", err);
                        error_count = error_count.saturating_add(1);
                    }
                }

                tokio::select! {
                    _ = sleep(next_delay(error_count)) => {}
                    _ = wake.notified() => {
                        debug!("[Sync] Runner woken for immediate refresh");
                    }
                }
            }
        });
        *guard = Some(handle);
    }

    /// Stop the loop, aborting any in-flight wait.
    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }

    /// Wake the loop now; called on visibility/connectivity regain and after
    /// local mutations that should sync promptly.
    pub fn request_refresh(&self) {
        self.wake.notify_one();
    }
}
