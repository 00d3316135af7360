use tokio::time::Duration;
use tracing::info;

use super::animation::{AnimationMode, PathAnimator};
use super::layers::SharedLayers;
use crate::path::Waypoint;

/// The surface a mission path is drawn on. Owns the path's decoration
/// animation, so there is never more than one per displayed path.
#[derive(Debug)]
pub struct PathDisplay {
    layers: SharedLayers,
    animator: PathAnimator,
}

impl PathDisplay {
    pub fn new(layers: SharedLayers, tick_interval: Duration) -> Self {
        Self {
            layers,
            animator: PathAnimator::new(tick_interval),
        }
    }

    pub fn layers(&self) -> &SharedLayers {
        &self.layers
    }

    /// Replaces the displayed path and restarts its decoration.
    pub fn show_path(&mut self, path: &[Waypoint]) -> Option<AnimationMode> {
        self.clear_path();

        {
            let mut layers = self.layers.write();
            layers.path = Some(path.to_vec());
            layers.set_waypoints(path);
        }

        let layers = self.layers.clone();
        self.animator
            .animate(path, move |markers| layers.write().set_path_markers(markers))
    }

    /// Stops the decoration timer and removes the path with all of its markers.
    pub fn clear_path(&mut self) {
        self.animator.stop();
        let mut layers = self.layers.write();
        if layers.path.is_some() {
            info!("Clearing displayed path");
        }
        layers.clear_path_decorations();
        layers.clear_waypoints();
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::animation::ANIMATION_TICK_INTERVAL;
    use crate::map::layers::BaseMarker;
    use tokio::time::sleep;

    fn triangle() -> Vec<Waypoint> {
        vec![
            Waypoint::new(-122.5, 37.7),
            Waypoint::new(-122.4, 37.8),
            Waypoint::new(-122.3, 37.75),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_path_draws_markers() {
        let layers = SharedLayers::new();
        let mut display = PathDisplay::new(layers.clone(), ANIMATION_TICK_INTERVAL);

        let mode = display.show_path(&triangle());
        assert_eq!(mode, Some(AnimationMode::Loop { markers: 3 }));
        assert!(display.is_animating());

        let before = layers.read().path_markers.clone();
        assert_eq!(before.len(), 3);

        sleep(Duration::from_millis(160)).await;
        let after = layers.read().path_markers.clone();
        assert_eq!(after.len(), 3);
        assert_ne!(before, after);
        assert_eq!(layers.read().waypoints.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_path_stops_timer_and_removes_markers() {
        let layers = SharedLayers::new();
        layers.write().add_base(BaseMarker {
            name: "HQ".to_string(),
            position: Waypoint::new(-122.4, 37.7),
        });
        let mut display = PathDisplay::new(layers.clone(), ANIMATION_TICK_INTERVAL);
        display.show_path(&[Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0)]);
        sleep(Duration::from_millis(320)).await;

        display.clear_path();
        display.clear_path();
        assert!(!display.is_animating());

        sleep(Duration::from_secs(1)).await;
        let snapshot = layers.snapshot();
        assert!(snapshot.path.is_none());
        assert!(snapshot.path_markers.is_empty());
        assert!(snapshot.waypoints.is_empty());
        assert_eq!(snapshot.bases.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redraw_keeps_single_animation() {
        let layers = SharedLayers::new();
        let mut display = PathDisplay::new(layers.clone(), ANIMATION_TICK_INTERVAL);
        for _ in 0..5 {
            display.show_path(&triangle());
            sleep(Duration::from_millis(40)).await;
        }
        display.show_path(&[Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0)]);
        sleep(Duration::from_millis(500)).await;
        // only the shuttle animation is left writing markers
        assert_eq!(layers.read().path_markers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_point_path_has_no_decoration() {
        let layers = SharedLayers::new();
        let mut display = PathDisplay::new(layers.clone(), ANIMATION_TICK_INTERVAL);
        assert_eq!(display.show_path(&[Waypoint::new(0.0, 0.0)]), None);
        assert!(!display.is_animating());
        assert!(layers.read().path_markers.is_empty());
        assert_eq!(layers.read().waypoints.len(), 1);
    }
}
