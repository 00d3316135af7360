//! Synthetic flight telemetry.
//!
//! Every value is a pure function of run progress (0..=100) and the baseline
//! handed to `start`, so identical progress always yields identical readings.

use serde::{Deserialize, Serialize};

/// Battery drained over a full run, in percent points.
const BATTERY_DRAIN_PER_PROGRESS: f64 = 0.3;
const BATTERY_FLOOR: f64 = 70.0;
const ALTITUDE_AMPLITUDE_M: f64 = 20.0;
const HEADING_DEG_PER_PROGRESS: f64 = 3.6;
const SIGNAL_AMPLITUDE: f64 = 5.0;
const SIGNAL_FLOOR: f64 = 75.0;

pub const CRUISE_SPEED: f64 = 12.0;
const SPEED_AMPLITUDE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub battery_level: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
    pub signal_strength: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            battery_level: 100.0,
            altitude_m: 100.0,
            heading_deg: 0.0,
            signal_strength: 95.0,
        }
    }
}

/// Telemetry at `progress` percent of the run, drifting from `baseline`.
pub fn drift(baseline: &Telemetry, progress: f64) -> Telemetry {
    let p = progress.clamp(0.0, 100.0);

    let battery_start = baseline.battery_level.clamp(0.0, 100.0);
    let battery_floor = BATTERY_FLOOR.min(battery_start);
    let battery_level = (battery_start - p * BATTERY_DRAIN_PER_PROGRESS).max(battery_floor);

    let altitude_m = baseline.altitude_m + (p / 20.0).sin() * ALTITUDE_AMPLITUDE_M;

    let heading_deg = wrap_degrees(baseline.heading_deg + p * HEADING_DEG_PER_PROGRESS);

    let signal_start = baseline.signal_strength.clamp(0.0, 100.0);
    let signal_strength = (signal_start - (p / 15.0).sin() * SIGNAL_AMPLITUDE)
        .clamp(SIGNAL_FLOOR.min(signal_start), 100.0);

    Telemetry {
        battery_level,
        altitude_m,
        heading_deg,
        signal_strength,
    }
}

/// Small oscillation around the cruise speed. Always positive.
pub fn speed_at(progress: f64) -> f64 {
    CRUISE_SPEED + (progress.clamp(0.0, 100.0) / 10.0).sin() * SPEED_AMPLITUDE
}

fn wrap_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_never_increases() {
        let baseline = Telemetry::default();
        let mut last = f64::MAX;
        for step in 0..=1000 {
            let t = drift(&baseline, step as f64 / 10.0);
            assert!(t.battery_level <= last);
            assert!(t.battery_level >= BATTERY_FLOOR);
            last = t.battery_level;
        }
        assert_eq!(drift(&baseline, 100.0).battery_level, 70.0);
    }

    #[test]
    fn test_low_battery_baseline_is_not_raised() {
        let baseline = Telemetry {
            battery_level: 40.0,
            ..Telemetry::default()
        };
        for step in 0..=100 {
            assert!(drift(&baseline, step as f64).battery_level <= 40.0);
        }
    }

    #[test]
    fn test_heading_wraps_into_range() {
        let baseline = Telemetry {
            heading_deg: 350.0,
            ..Telemetry::default()
        };
        for step in 0..=200 {
            let heading = drift(&baseline, step as f64 / 2.0).heading_deg;
            assert!((0.0..360.0).contains(&heading), "{heading}");
        }
        assert!((drift(&baseline, 10.0).heading_deg - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_and_signal_stay_bounded() {
        let baseline = Telemetry::default();
        for step in 0..=100 {
            let t = drift(&baseline, step as f64);
            assert!((t.altitude_m - 100.0).abs() <= ALTITUDE_AMPLITUDE_M + 1e-9);
            assert!((SIGNAL_FLOOR..=100.0).contains(&t.signal_strength));
        }
    }

    #[test]
    fn test_speed_is_positive() {
        for step in 0..=100 {
            let speed = speed_at(step as f64);
            assert!(speed >= CRUISE_SPEED - SPEED_AMPLITUDE);
            assert!(speed > 0.0);
        }
    }

    #[test]
    fn test_drift_is_deterministic() {
        let baseline = Telemetry::default();
        assert_eq!(drift(&baseline, 42.5), drift(&baseline, 42.5));
    }
}
