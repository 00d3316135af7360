pub mod animation;
pub mod display;
pub mod layers;

pub use animation::{
    AnimationMode, PathAnimation, PathAnimator, ANIMATION_TICK_INTERVAL, LOOP_PROGRESS_INCREMENT,
    MAX_LOOP_MARKERS, SHUTTLE_PROGRESS_INCREMENT,
};
pub use display::PathDisplay;
pub use layers::{BaseMarker, DroneMarker, MapLayers, SharedLayers};
