use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::path::Waypoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMarker {
    pub name: String,
    pub position: Waypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneMarker {
    pub id: String,
    pub name: String,
    pub position: Waypoint,
}

/// Everything drawn on the map, one collection per marker kind.
///
/// Each collection is owned separately so clearing one kind can never remove
/// markers of another.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapLayers {
    pub bases: Vec<BaseMarker>,
    pub drones: BTreeMap<String, DroneMarker>,
    pub waypoints: Vec<Waypoint>,
    pub path: Option<Vec<Waypoint>>,
    pub path_markers: Vec<Waypoint>,
}

impl MapLayers {
    pub fn add_base(&mut self, base: BaseMarker) {
        self.bases.push(base);
    }

    pub fn upsert_drone(&mut self, id: &str, name: &str, position: Waypoint) {
        self.drones
            .entry(id.to_string())
            .and_modify(|drone| drone.position = position)
            .or_insert_with(|| DroneMarker {
                id: id.to_string(),
                name: name.to_string(),
                position,
            });
    }

    pub fn remove_drone(&mut self, id: &str) -> Option<DroneMarker> {
        self.drones.remove(id)
    }

    pub fn set_waypoints(&mut self, waypoints: &[Waypoint]) {
        self.waypoints = waypoints.to_vec();
    }

    pub fn clear_waypoints(&mut self) {
        self.waypoints.clear();
    }

    pub fn set_path_markers(&mut self, markers: Vec<Waypoint>) {
        self.path_markers = markers;
    }

    /// Drops the displayed path together with its decoration markers.
    pub fn clear_path_decorations(&mut self) {
        self.path = None;
        self.path_markers.clear();
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

/// Cloneable handle to layers shared between the animation task, the
/// simulation callbacks and the web surface.
#[derive(Debug, Clone, Default)]
pub struct SharedLayers {
    inner: Arc<RwLock<MapLayers>>,
}

impl SharedLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MapLayers> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MapLayers> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> MapLayers {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> MapLayers {
        let mut layers = MapLayers::default();
        layers.add_base(BaseMarker {
            name: "Pier 39".to_string(),
            position: Waypoint::new(-122.4098, 37.8087),
        });
        layers.upsert_drone("d1", "Scout", Waypoint::new(-122.41, 37.80));
        layers.set_waypoints(&[Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 1.0)]);
        layers.path = Some(vec![Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 1.0)]);
        layers.set_path_markers(vec![Waypoint::new(0.5, 0.5)]);
        layers
    }

    #[test]
    fn test_clearing_path_keeps_other_layers() {
        let mut layers = populated();
        layers.clear_path_decorations();
        assert!(layers.path.is_none());
        assert!(layers.path_markers.is_empty());
        assert_eq!(layers.bases.len(), 1);
        assert_eq!(layers.drones.len(), 1);
        assert_eq!(layers.waypoints.len(), 2);
    }

    #[test]
    fn test_clearing_waypoints_keeps_drones_and_bases() {
        let mut layers = populated();
        layers.clear_waypoints();
        assert!(layers.waypoints.is_empty());
        assert_eq!(layers.bases.len(), 1);
        assert_eq!(layers.drones.len(), 1);
        assert_eq!(layers.path_markers.len(), 1);
    }

    #[test]
    fn test_upsert_drone_moves_existing_marker() {
        let mut layers = populated();
        layers.upsert_drone("d1", "ignored", Waypoint::new(-122.0, 37.0));
        assert_eq!(layers.drones.len(), 1);
        let drone = &layers.drones["d1"];
        assert_eq!(drone.name, "Scout");
        assert_eq!(drone.position, Waypoint::new(-122.0, 37.0));

        assert!(layers.remove_drone("d1").is_some());
        assert!(layers.remove_drone("d1").is_none());
    }

    #[test]
    fn test_shared_layers_snapshot() {
        let shared = SharedLayers::new();
        shared.write().upsert_drone("d2", "Relay", Waypoint::new(1.0, 2.0));
        let snapshot = shared.snapshot();
        shared.write().clear_all();
        assert_eq!(snapshot.drones.len(), 1);
        assert!(shared.read().drones.is_empty());
    }
}
