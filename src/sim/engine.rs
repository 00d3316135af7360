use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{Clock, TokioClock};
use super::telemetry::{drift, speed_at, Telemetry};
use crate::path::{interpolate_segment, Waypoint};
use crate::scheduler::Ticker;

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Reported for every tick of a run over an empty path.
pub const FALLBACK_POSITION: Waypoint = Waypoint::new(-122.4194, 37.7749);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationUpdate {
    /// Percent complete, 0..=100.
    pub progress: f64,
    pub current_position: Waypoint,
    pub telemetry: Telemetry,
    pub speed: f64,
    /// Whole seconds left, rounded up.
    pub time_remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    Running,
    Paused,
}

/// Position after `progress` percent of a run, giving every segment an equal
/// share of time regardless of its length.
pub fn position_at(path: &[Waypoint], progress: f64) -> Waypoint {
    match path {
        [] => FALLBACK_POSITION,
        [only] => *only,
        _ => {
            let segment_count = path.len() - 1;
            let per_segment = 100.0 / segment_count as f64;
            let p = progress.clamp(0.0, 100.0);
            let index = ((p / per_segment).floor() as usize).min(segment_count - 1);
            let fraction = (p - index as f64 * per_segment) / per_segment;
            interpolate_segment(path[index], path[index + 1], fraction)
        }
    }
}

enum TickOutcome {
    /// Run was stopped or replaced; the ticker should end.
    Stale,
    Paused,
    Update {
        update: SimulationUpdate,
        finished: bool,
    },
}

#[derive(Debug)]
struct RunState {
    generation: u64,
    run_id: Option<Uuid>,
    status: SimulationStatus,
    path: Vec<Waypoint>,
    duration_secs: f64,
    baseline: Telemetry,
    started_at: Option<Instant>,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl RunState {
    fn new() -> Self {
        Self {
            generation: 0,
            run_id: None,
            status: SimulationStatus::Idle,
            path: Vec::new(),
            duration_secs: 0.0,
            baseline: Telemetry::default(),
            started_at: None,
            paused_total: Duration::ZERO,
            paused_at: None,
        }
    }

    fn begin(
        &mut self,
        path: Vec<Waypoint>,
        duration_secs: f64,
        baseline: Telemetry,
        now: Instant,
    ) -> (u64, Uuid) {
        let run_id = Uuid::new_v4();
        self.generation += 1;
        self.run_id = Some(run_id);
        self.status = SimulationStatus::Running;
        self.path = path;
        self.duration_secs = duration_secs;
        self.baseline = baseline;
        self.started_at = Some(now);
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
        (self.generation, run_id)
    }

    fn end(&mut self) {
        self.generation += 1;
        self.run_id = None;
        self.status = SimulationStatus::Idle;
        self.path.clear();
        self.started_at = None;
        self.paused_at = None;
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        now.saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    fn advance(&mut self, generation: u64, now: Instant) -> TickOutcome {
        if generation != self.generation || self.status == SimulationStatus::Idle {
            return TickOutcome::Stale;
        }
        if self.status == SimulationStatus::Paused {
            return TickOutcome::Paused;
        }

        let elapsed_ms = self.elapsed(now).as_secs_f64() * 1000.0;
        let total_ms = self.duration_secs * 1000.0;
        let (progress, time_remaining) = if total_ms.is_finite() && total_ms > 0.0 {
            let progress = (elapsed_ms / total_ms * 100.0).min(100.0);
            let remaining = ((total_ms - elapsed_ms) / 1000.0).ceil().max(0.0);
            (progress, remaining as u64)
        } else {
            (100.0, 0)
        };

        let update = SimulationUpdate {
            progress,
            current_position: position_at(&self.path, progress),
            telemetry: drift(&self.baseline, progress),
            speed: speed_at(progress),
            time_remaining,
        };

        let finished = progress >= 100.0;
        if finished {
            if let Some(run_id) = self.run_id {
                info!("[sim {}] Run complete", run_id);
            }
            self.end();
        }
        TickOutcome::Update { update, finished }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one simulated flight at a time along a waypoint path.
///
/// `start` installs a repeating tick; every tick reports a [`SimulationUpdate`]
/// until progress reaches 100, after which `on_complete` fires once and the
/// engine is idle again. Starting while a run is active replaces that run.
///
/// Callbacks run outside the state lock but inside `delivery`, which `stop`
/// and `start` also take. Once either returns, the replaced run delivers
/// nothing more.
pub struct SimulationEngine<C: Clock = TokioClock> {
    clock: Arc<C>,
    state: Arc<Mutex<RunState>>,
    delivery: Arc<Mutex<()>>,
    ticker: Ticker,
}

impl SimulationEngine<TokioClock> {
    pub fn new() -> Self {
        Self::with_clock(TokioClock, TICK_INTERVAL)
    }
}

impl Default for SimulationEngine<TokioClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SimulationEngine<C> {
    pub fn with_clock(clock: C, tick_interval: Duration) -> Self {
        Self {
            clock: Arc::new(clock),
            state: Arc::new(Mutex::new(RunState::new())),
            delivery: Arc::new(Mutex::new(())),
            ticker: Ticker::new("simulation", tick_interval),
        }
    }

    pub fn start<U, F>(
        &mut self,
        path: Vec<Waypoint>,
        duration_secs: f64,
        initial_telemetry: Telemetry,
        mut on_update: U,
        on_complete: F,
    ) where
        U: FnMut(SimulationUpdate) + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        // the previous run's task must be gone before the new one is installed
        self.ticker.cancel();

        let waypoints = path.len();
        let (generation, run_id) = {
            let _delivery = lock(&self.delivery);
            let mut state = lock(&self.state);
            if let Some(previous) = state.run_id {
                info!("[sim {}] Superseded by a new run", previous);
            }
            state.begin(path, duration_secs, initial_telemetry, self.clock.now())
        };

        if duration_secs <= 0.0 || !duration_secs.is_finite() {
            warn!(
                "[sim {}] Non-positive duration {}, run completes on first tick",
                run_id, duration_secs
            );
        }

        let state = Arc::clone(&self.state);
        let delivery = Arc::clone(&self.delivery);
        let clock = Arc::clone(&self.clock);
        let mut on_complete = Some(on_complete);

        let installed = self.ticker.start(move || {
            let _delivery = lock(&delivery);
            let outcome = lock(&state).advance(generation, clock.now());
            match outcome {
                TickOutcome::Stale => ControlFlow::Break(()),
                TickOutcome::Paused => ControlFlow::Continue(()),
                TickOutcome::Update { update, finished } => {
                    debug!(
                        "[sim {}] progress={:.1} remaining={}s",
                        run_id, update.progress, update.time_remaining
                    );
                    on_update(update);
                    if finished {
                        if let Some(done) = on_complete.take() {
                            done();
                        }
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
            }
        });

        if installed {
            info!(
                "[sim {}] Started: {} waypoints over {}s",
                run_id, waypoints, duration_secs
            );
        } else {
            lock(&self.state).end();
        }
    }

    /// Freezes the logical clock. No-op unless a run is ticking.
    pub fn pause(&mut self) {
        if !self.ticker.is_active() {
            return;
        }
        let now = self.clock.now();
        let mut state = lock(&self.state);
        if state.status == SimulationStatus::Running {
            state.status = SimulationStatus::Paused;
            state.paused_at = Some(now);
            if let Some(run_id) = state.run_id {
                info!("[sim {}] Paused", run_id);
            }
        }
    }

    /// Resumes a paused run; the paused span is excluded from elapsed time.
    pub fn resume(&mut self) {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        if state.status != SimulationStatus::Paused {
            return;
        }
        if let Some(paused_at) = state.paused_at.take() {
            let paused_for = now.saturating_duration_since(paused_at);
            state.paused_total += paused_for;
            if let Some(run_id) = state.run_id {
                info!("[sim {}] Resumed after {:?}", run_id, paused_for);
            }
        }
        state.status = SimulationStatus::Running;
    }

    /// Cancels the active run, if any. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.ticker.cancel();
        let _delivery = lock(&self.delivery);
        let mut state = lock(&self.state);
        if let Some(run_id) = state.run_id {
            info!("[sim {}] Stopped", run_id);
        }
        state.end();
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_active() && lock(&self.state).status != SimulationStatus::Idle
    }

    pub fn status(&self) -> SimulationStatus {
        if self.ticker.is_active() {
            lock(&self.state).status
        } else {
            SimulationStatus::Idle
        }
    }
}
