//! Cancellable repeating task.
//!
//! A [`Ticker`] owns at most one tokio task that calls a closure once per
//! period. The first call happens one full period after `start`, the way a
//! browser interval timer behaves. Driving the runtime with tokio's paused
//! clock makes every tick deterministic in tests.

use std::ops::ControlFlow;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period: period.max(MIN_PERIOD),
            handle: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Installs `on_tick` as the repeating task, tearing down any previous
    /// one first. Returning `ControlFlow::Break` from the closure ends the task.
    ///
    /// Outside a tokio runtime nothing is installed and `false` is returned.
    pub fn start<F>(&mut self, mut on_tick: F) -> bool
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        self.cancel();

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("[{}] No tokio runtime, ticker not started: {}", self.name, e);
                return false;
            }
        };

        let name = self.name;
        let period = self.period;
        debug!("[{}] Starting ticker with period {:?}", name, period);

        self.handle = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!("[{}] tick", name);
                if on_tick().is_break() {
                    debug!("[{}] Ticker finished", name);
                    break;
                }
            }
        }));
        true
    }

    /// Aborts the running task, if any. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("[{}] Cancelling ticker", self.name);
            }
            handle.abort();
        }
    }

    /// Whether a task is installed and has not finished yet.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
