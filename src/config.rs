use std::path::Path;

use anyhow::{bail, Context, Result};
use config::{Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tokio::time::Duration;

use crate::map::BaseMarker;
use crate::path::Waypoint;
use crate::sim::Telemetry;

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    pub mission: MissionConfig,
    pub web: WebConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
    pub vehicle_id: String,
    #[serde(default = "default_vehicle_name")]
    pub vehicle_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub duration_secs: f64,
    pub initial_telemetry: Telemetry,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub tick_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct MissionConfig {
    pub path: Vec<Waypoint>,
    #[serde(default)]
    pub bases: Vec<BaseMarker>,
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

fn default_vehicle_name() -> String {
    "drone".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            duration_secs: 60.0,
            initial_telemetry: Telemetry::default(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 150,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl AnimationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let env = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config_path = format!("config/{}.toml", env);
        let fallback_path = format!("/etc/skyroute/{}.toml", env);

        if Path::new(&config_path).exists() {
            Self::load_from(&config_path)
        } else {
            Self::load_from(&fallback_path)
        }
    }

    /// Loads `path`, then applies `SKYROUTE__SECTION__KEY` environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("SKYROUTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulation.tick_interval_ms == 0 {
            bail!("simulation.tick_interval_ms must be greater than zero");
        }
        if self.animation.tick_interval_ms == 0 {
            bail!("animation.tick_interval_ms must be greater than zero");
        }
        if !self.simulation.duration_secs.is_finite() {
            bail!("simulation.duration_secs must be a finite number");
        }
        for (index, point) in self.mission.path.iter().enumerate() {
            if !valid_coordinate(point) {
                bail!(
                    "mission.path[{}] = [{}, {}] is outside [-180, 180] x [-90, 90]",
                    index,
                    point.lon,
                    point.lat
                );
            }
        }
        for base in &self.mission.bases {
            if !valid_coordinate(&base.position) {
                bail!("base '{}' has an invalid position", base.name);
            }
        }
        Ok(())
    }
}

fn valid_coordinate(point: &Waypoint) -> bool {
    (-180.0..=180.0).contains(&point.lon) && (-90.0..=90.0).contains(&point.lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
[general]
log_level = "info"
vehicle_id = "drone-7"

[simulation]
duration_secs = 30.0

[simulation.initial_telemetry]
battery_level = 90.0
altitude_m = 120.0
heading_deg = 45.0
signal_strength = 88.0

[mission]
path = [[-122.4194, 37.7749], [-122.4094, 37.7849], [-122.4000, 37.7800]]
bases = [{ name = "Mission Bay", position = [-122.3915, 37.7706] }]

[web]
host = "127.0.0.1"
port = 3000
"#;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_sample_config() -> Result<()> {
        let (_dir, path) = write_config(SAMPLE);
        let config = Config::load_from(&path)?;

        assert_eq!(config.general.vehicle_id, "drone-7");
        assert_eq!(config.general.vehicle_name, "drone");
        assert_eq!(config.simulation.duration_secs, 30.0);
        assert_eq!(config.simulation.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.animation.tick_interval(), Duration::from_millis(150));
        assert_eq!(config.simulation.initial_telemetry.battery_level, 90.0);
        assert_eq!(config.mission.path.len(), 3);
        assert_eq!(config.mission.path[0], Waypoint::new(-122.4194, 37.7749));
        assert_eq!(config.mission.bases[0].name, "Mission Bay");
        assert_eq!(config.web.port, 3000);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        let contents = SAMPLE.replace(
            "[simulation]\n",
            "[simulation]\ntick_interval_ms = 0\n",
        );
        let (_dir, path) = write_config(&contents);
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"), "{err}");
    }

    #[test]
    fn test_rejects_out_of_range_waypoint() {
        let contents = SAMPLE.replace("[-122.4000, 37.7800]", "[-222.4000, 37.7800]");
        let (_dir, path) = write_config(&contents);
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("mission.path[2]"), "{err}");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(dir.path().join("absent.toml")).is_err());
    }
}
