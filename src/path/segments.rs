use serde::Serialize;

use super::geometry::{compute_bearing, interpolate_segment, project_coordinate, Waypoint};

/// One span between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentData {
    pub start: Waypoint,
    pub end: Waypoint,
    /// Planar length in projected meters.
    pub length: f64,
    /// Sum of the lengths of every earlier segment.
    pub cumulative_start: f64,
}

impl SegmentData {
    pub fn cumulative_end(&self) -> f64 {
        self.cumulative_start + self.length
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentCollection {
    pub segments: Vec<SegmentData>,
    pub total_length: f64,
}

impl SegmentCollection {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Point and local heading at some distance along a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathSample {
    pub point: Waypoint,
    pub bearing: f64,
}

/// Builds the cumulative-length segment table for `path`.
/// Fewer than two points yields an empty table with zero total length.
pub fn compute_segments(path: &[Waypoint]) -> SegmentCollection {
    let mut segments = Vec::with_capacity(path.len().saturating_sub(1));
    let mut total_length = 0.0;

    for pair in path.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let a = project_coordinate(start.lon, start.lat);
        let b = project_coordinate(end.lon, end.lat);
        let length = a.distance_to(&b);
        segments.push(SegmentData {
            start,
            end,
            length,
            cumulative_start: total_length,
        });
        total_length += length;
    }

    SegmentCollection {
        segments,
        total_length,
    }
}

/// Samples the path at `fraction` of its total length.
///
/// Returns `None` when the path has no length, or when the matching segment
/// is degenerate. Callers treat that as "nothing to draw", not as an error.
pub fn interpolate_path(collection: &SegmentCollection, fraction: f64) -> Option<PathSample> {
    if collection.total_length <= 0.0 || !fraction.is_finite() {
        return None;
    }

    let target = collection.total_length * fraction.clamp(0.0, 1.0);
    let segment = collection
        .segments
        .iter()
        .find(|s| s.cumulative_end() >= target)
        .or_else(|| collection.segments.last())?;

    if segment.length <= 0.0 {
        return None;
    }

    let local = (target - segment.cumulative_start) / segment.length;
    Some(PathSample {
        point: interpolate_segment(segment.start, segment.end, local),
        bearing: compute_bearing(segment.start, segment.end),
    })
}
