//! Decorative "flow" markers moving along a displayed path.
//!
//! Two-point paths get one marker shuttling between the endpoints. Longer
//! paths are closed into a loop and get up to four evenly spaced markers that
//! travel around it by distance. Both modes step at the same rate.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::path::{
    compute_segments, create_closed_path, interpolate_path, interpolate_segment, SegmentCollection,
    Waypoint,
};
use crate::scheduler::Ticker;

pub const ANIMATION_TICK_INTERVAL: Duration = Duration::from_millis(150);

pub const SHUTTLE_PROGRESS_INCREMENT: f64 = 0.01;
pub const LOOP_PROGRESS_INCREMENT: f64 = 0.01;

pub const MAX_LOOP_MARKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    Shuttle,
    Loop { markers: usize },
}

#[derive(Debug, Clone)]
enum Motion {
    Shuttle {
        start: Waypoint,
        end: Waypoint,
        direction: f64,
    },
    Loop {
        segments: SegmentCollection,
        markers: usize,
    },
}

/// Marker state for one displayed path. Stepping is pure, so the timer that
/// drives it lives elsewhere ([`PathAnimator`]).
#[derive(Debug, Clone)]
pub struct PathAnimation {
    motion: Motion,
    progress: f64,
}

impl PathAnimation {
    /// Picks the animation for `path`; `None` when there is nothing to animate.
    pub fn for_path(path: &[Waypoint]) -> Option<Self> {
        let motion = match path {
            [] | [_] => return None,
            [start, end] => Motion::Shuttle {
                start: *start,
                end: *end,
                direction: 1.0,
            },
            _ => {
                let segments = compute_segments(&create_closed_path(path));
                let markers = MAX_LOOP_MARKERS.min(segments.len());
                Motion::Loop { segments, markers }
            }
        };
        Some(Self {
            motion,
            progress: 0.0,
        })
    }

    pub fn mode(&self) -> AnimationMode {
        match &self.motion {
            Motion::Shuttle { .. } => AnimationMode::Shuttle,
            Motion::Loop { markers, .. } => AnimationMode::Loop { markers: *markers },
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Advances by one tick.
    pub fn step(&mut self) {
        match &mut self.motion {
            Motion::Shuttle { direction, .. } => {
                self.progress += SHUTTLE_PROGRESS_INCREMENT * *direction;
                if self.progress >= 1.0 {
                    self.progress = 1.0;
                    *direction = -1.0;
                } else if self.progress <= 0.0 {
                    self.progress = 0.0;
                    *direction = 1.0;
                }
            }
            Motion::Loop { .. } => {
                self.progress = (self.progress + LOOP_PROGRESS_INCREMENT).rem_euclid(1.0);
            }
        }
    }

    /// Where each marker should be drawn right now. A loop with no length
    /// yields no positions.
    pub fn marker_positions(&self) -> Vec<Waypoint> {
        match &self.motion {
            Motion::Shuttle {
                start,
                end,
                direction,
            } => {
                let fraction = if *direction > 0.0 {
                    self.progress
                } else {
                    1.0 - self.progress
                };
                vec![interpolate_segment(*start, *end, fraction)]
            }
            Motion::Loop { segments, markers } => (0..*markers)
                .filter_map(|i| {
                    let phase = (self.progress + i as f64 / *markers as f64).rem_euclid(1.0);
                    interpolate_path(segments, phase).map(|sample| sample.point)
                })
                .collect(),
        }
    }
}

fn lock(generation: &Mutex<u64>) -> MutexGuard<'_, u64> {
    generation.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the timer for one path's decoration. Only one animation runs at a
/// time; animating a new path tears the old timer down first.
///
/// Frames are delivered while holding the generation lock, so once `stop`
/// returns no frame of the stopped animation is in flight or still to come.
#[derive(Debug)]
pub struct PathAnimator {
    ticker: Ticker,
    generation: Arc<Mutex<u64>>,
}

impl PathAnimator {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            ticker: Ticker::new("path-animation", tick_interval),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Starts animating `path`, handing marker positions to `on_frame` every
    /// tick. Returns the chosen mode, or `None` when the path has no animation.
    pub fn animate<F>(&mut self, path: &[Waypoint], mut on_frame: F) -> Option<AnimationMode>
    where
        F: FnMut(Vec<Waypoint>) + Send + 'static,
    {
        self.stop();

        let mut animation = PathAnimation::for_path(path)?;
        let mode = animation.mode();
        on_frame(animation.marker_positions());

        let current = *lock(&self.generation);
        let generation = Arc::clone(&self.generation);
        let started = self.ticker.start(move || {
            let guard = lock(&generation);
            if *guard != current {
                return ControlFlow::Break(());
            }
            animation.step();
            on_frame(animation.marker_positions());
            drop(guard);
            ControlFlow::Continue(())
        });
        if !started {
            return None;
        }

        info!("Animating {} waypoint path as {:?}", path.len(), mode);
        Some(mode)
    }

    pub fn stop(&mut self) {
        if self.ticker.is_active() {
            debug!("Stopping path animation");
        }
        // waits for a frame already being delivered
        *lock(&self.generation) += 1;
        self.ticker.cancel();
    }

    pub fn is_animating(&self) -> bool {
        self.ticker.is_active()
    }
}

impl Default for PathAnimator {
    fn default() -> Self {
        Self::new(ANIMATION_TICK_INTERVAL)
    }
}
