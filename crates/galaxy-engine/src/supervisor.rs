//! Watchdog for the scheduler task.
//!
//! The scheduler loop never returns on its own. If its task ends anyway
//! (a panic inside a tick, or the loop exiting), the simulation is
//! frozen, so the watchdog logs the failure and signals the server to
//! shut down.

use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::error;

/// Handle for stopping a supervised scheduler.
#[derive(Debug)]
pub struct SchedulerGuard {
    abort: AbortHandle,
    watchdog: JoinHandle<bool>,
}

impl SchedulerGuard {
    /// Abort the scheduler and wait for the watchdog.
    ///
    /// Returns `true` if the scheduler had already stopped by itself.
    pub async fn stop(self) -> bool {
        self.abort.abort();
        self.watchdog.await.unwrap_or(true)
    }
}

/// Start watching `task`.
///
/// The returned receiver completes when the scheduler stops without
/// being asked to.
pub fn supervise(task: JoinHandle<()>) -> (SchedulerGuard, oneshot::Receiver<()>) {
    let abort = task.abort_handle();
    let (stopped_tx, stopped_rx) = oneshot::channel();

    let watchdog = tokio::spawn(async move {
        let failed = match task.await {
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                error!(error = %e, "Galaxy scheduler panicked, shutting down");
                true
            }
            Ok(()) => {
                error!("Galaxy scheduler exited unexpectedly, shutting down");
                true
            }
        };
        if failed {
            // The server may already be gone.
            stopped_tx.send(()).ok();
        }
        failed
    });

    (SchedulerGuard { abort, watchdog }, stopped_rx)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn unexpected_exit_signals_shutdown() {
        let (guard, stopped) = supervise(tokio::spawn(async {}));
        tokio::time::timeout(Duration::from_secs(5), stopped)
            .await
            .unwrap()
            .unwrap();
        assert!(guard.stop().await);
    }

    #[tokio::test]
    async fn panic_signals_shutdown() {
        let (guard, stopped) = supervise(tokio::spawn(async {
            panic!("tick exploded");
        }));
        tokio::time::timeout(Duration::from_secs(5), stopped)
            .await
            .unwrap()
            .unwrap();
        assert!(guard.stop().await);
    }

    #[tokio::test]
    async fn requested_stop_is_not_a_failure() {
        let (guard, mut stopped) = supervise(tokio::spawn(std::future::pending::<()>()));
        tokio::task::yield_now().await;
        assert!(stopped.try_recv().is_err());
        assert!(!guard.stop().await);
    }
}
