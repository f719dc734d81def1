//! Polling refresher - periodic background reconciliation
//!
//! The poll loop is an explicit task owned by whoever started it. Dropping
//! or stopping the [`PollingHandle`] cancels it, so a torn-down view never
//! receives further updates. Each tick awaits its refresh before the next
//! tick is taken, and missed ticks are skipped rather than bunched up.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { conversations: usize },
    /// Another refresh was already in flight
    Skipped,
}

/// Admits at most one refresh at a time
#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: AtomicBool,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_enter(&self) -> Option<RefreshPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    gate: &'a RefreshGate,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

/// Handle to a running poll loop
#[derive(Debug)]
pub struct PollingHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the loop and wait for it to exit
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Polling task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn a loop calling `refresh` every `period`, starting one period from
/// now. Refresh errors are logged and swallowed.
pub fn spawn_polling<F, Fut>(period: Duration, mut refresh: F) -> PollingHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<RefreshOutcome>> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Polling started");

        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    match refresh().await {
                        Ok(outcome) => debug!(?outcome, "Background refresh finished"),
                        Err(e) => warn!("Background refresh failed: {}", e),
                    }
                }
            }
        }

        info!("Polling stopped");
    });

    PollingHandle {
        token,
        task: Some(task),
    }
}
