pub mod geometry;
pub mod segments;


pub use geometry::{
    compute_bearing, create_closed_path, interpolate_segment, is_closed, project_coordinate,
    PlanarPoint, Waypoint, EARTH_RADIUS_M,
};
pub use segments::{compute_segments, interpolate_path, PathSample, SegmentCollection, SegmentData};
