use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

/// Earth radius used by the planar projection, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A `(longitude, latitude)` pair in degrees. Serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Waypoint {
    pub lon: f64,
    pub lat: f64,
}

impl Waypoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for Waypoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Waypoint> for [f64; 2] {
    fn from(point: Waypoint) -> Self {
        [point.lon, point.lat]
    }
}

/// Local planar coordinate produced by [`project_coordinate`], in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn distance_to(&self, other: &PlanarPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Spherical-Mercator style projection. Only meant for relative distances
/// and angles over short ranges; no range validation is done.
pub fn project_coordinate(lon: f64, lat: f64) -> PlanarPoint {
    let lambda = lon.to_radians();
    let phi = lat.to_radians();
    PlanarPoint {
        x: EARTH_RADIUS_M * lambda,
        y: EARTH_RADIUS_M * (FRAC_PI_4 + phi / 2.0).tan().ln(),
    }
}

/// Linear interpolation between `start` and `end`. `fraction` is clamped to
/// `[0, 1]` so the result never leaves the segment.
pub fn interpolate_segment(start: Waypoint, end: Waypoint, fraction: f64) -> Waypoint {
    let t = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    // weighted form so t == 0 and t == 1 land exactly on the endpoints
    Waypoint {
        lon: start.lon * (1.0 - t) + end.lon * t,
        lat: start.lat * (1.0 - t) + end.lat * t,
    }
}

/// Planar bearing from `start` to `end` in degrees, normalized into `[0, 360)`.
/// Due east is 0, angles grow counter-clockwise.
pub fn compute_bearing(start: Waypoint, end: Waypoint) -> f64 {
    let a = project_coordinate(start.lon, start.lat);
    let b = project_coordinate(end.lon, end.lat);
    let degrees = (b.y - a.y).atan2(b.x - a.x).to_degrees();
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Returns `path` closed into a loop by repeating its first point at the end.
///
/// Paths with fewer than three points, and paths whose last point already
/// equals the first, are returned unchanged.
pub fn create_closed_path(path: &[Waypoint]) -> Vec<Waypoint> {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) if path.len() >= 3 && first != last => {
            let mut closed = Vec::with_capacity(path.len() + 1);
            closed.extend_from_slice(path);
            closed.push(*first);
            closed
        }
        _ => path.to_vec(),
    }
}

/// Whether `path` is a loop, i.e. has at least three points and ends where it starts.
pub fn is_closed(path: &[Waypoint]) -> bool {
    path.len() >= 3 && path.first() == path.last()
}
