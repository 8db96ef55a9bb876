//! Timers with an explicit start/cancel lifecycle.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A background task that runs `tick` on a fixed interval until cancelled.
///
/// The first tick fires immediately. Dropping the handle cancels the task.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn start<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // A tick in progress is abandoned on cancel, not finished.
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = tick() => {}
                }
            }
            debug!("Periodic task '{}' stopped", name);
        });

        debug!("Periodic task '{}' started every {:?}", name, period);
        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the task to exit.
    pub async fn stop(mut self) {
        debug!("Stopping periodic task '{}'", self.name);
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
