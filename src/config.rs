//! Engine configuration
//!
//! Loaded from TOML. Every field has a default so an empty file (or no file at all)
//! produces the stock header animation.

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{camera, lightning, population};
use crate::error::{EngineError, EngineResult};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Device pixels per container pixel
    pub pixel_ratio: f32,
    /// RGBA clear colour; alpha 0 keeps the header background visible
    pub clear_color: [f32; 4],
    /// Descriptor applied right after a successful init
    pub initial_weather: Option<String>,
    pub camera: CameraConfig,
    pub population: PopulationConfig,
    pub lightning: LightningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pixel_ratio: 1.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            initial_weather: None,
            camera: CameraConfig::default(),
            population: PopulationConfig::default(),
            lightning: LightningConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: camera::FOV_Y_DEGREES,
            znear: camera::ZNEAR,
            zfar: camera::ZFAR,
            position: Vec3::from_array(camera::POSITION),
        }
    }
}

/// Per-generator populations. Values above the hard caps are clamped on load and at engine init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub rain: usize,
    pub snow: usize,
    pub stars: usize,
    pub sun_rays: usize,
    pub clouds: usize,
    pub wind_streaks: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            rain: population::RAIN_COUNT,
            snow: population::SNOW_COUNT,
            stars: population::STAR_COUNT,
            sun_rays: population::SUN_RAY_COUNT,
            clouds: population::CLOUD_COUNT,
            wind_streaks: population::WIND_STREAK_COUNT,
        }
    }
}

impl PopulationConfig {
    /// Clamp every population to its hard cap, returning how many fields changed
    pub fn clamp_to_caps(&mut self) -> usize {
        let caps = PopulationConfig::default();
        let mut clamped = 0;
        for (value, cap, name) in [
            (&mut self.rain, caps.rain, "rain"),
            (&mut self.snow, caps.snow, "snow"),
            (&mut self.stars, caps.stars, "stars"),
            (&mut self.sun_rays, caps.sun_rays, "sun_rays"),
            (&mut self.clouds, caps.clouds, "clouds"),
            (&mut self.wind_streaks, caps.wind_streaks, "wind_streaks"),
        ] {
            if *value > cap {
                log::warn!(
                    "[PopulationConfig::clamp_to_caps] {} population {} exceeds cap {}, clamping",
                    name,
                    value,
                    cap
                );
                *value = cap;
                clamped += 1;
            }
        }
        clamped
    }
}

/// Lightning spawner interval: `min_interval_ms + U(0, interval_jitter_ms)`, chosen when armed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    pub min_interval_ms: u64,
    pub interval_jitter_ms: u64,
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: lightning::MIN_INTERVAL.as_millis() as u64,
            interval_jitter_ms: lightning::INTERVAL_JITTER.as_millis() as u64,
        }
    }
}

impl LightningConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn interval_jitter(&self) -> Duration {
        Duration::from_millis(self.interval_jitter_ms)
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let mut config: EngineConfig = toml::from_str(source)?;
        config.population.clamp_to_caps();
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[EngineConfig::load] Loaded config from {}", path.display());
        Self::from_toml_str(&source)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(EngineError::InvalidConfig {
                field: "pixel_ratio",
                reason: format!("must be a positive number, got {}", self.pixel_ratio),
            });
        }
        if !(self.camera.fov_y_degrees > 0.0 && self.camera.fov_y_degrees < 180.0) {
            return Err(EngineError::InvalidConfig {
                field: "camera.fov_y_degrees",
                reason: format!("must be in (0, 180), got {}", self.camera.fov_y_degrees),
            });
        }
        if !(self.camera.znear > 0.0 && self.camera.zfar > self.camera.znear) {
            return Err(EngineError::InvalidConfig {
                field: "camera.zfar",
                reason: format!(
                    "need 0 < znear < zfar, got {} / {}",
                    self.camera.znear, self.camera.zfar
                ),
            });
        }
        if self.lightning.min_interval_ms == 0 {
            return Err(EngineError::InvalidConfig {
                field: "lightning.min_interval_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.population.rain, population::RAIN_COUNT);
    }

    #[test]
    fn test_partial_document_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 7
            pixel_ratio = 2.0
            initial_weather = "Light Snow"

            [population]
            rain = 300

            [camera]
            position = [0.0, 2.0, 12.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.pixel_ratio, 2.0);
        assert_eq!(config.population.rain, 300);
        assert_eq!(config.population.snow, population::SNOW_COUNT);
        assert_eq!(config.camera.position, Vec3::new(0.0, 2.0, 12.0));
        assert_eq!(config.initial_weather.as_deref(), Some("Light Snow"));
    }

    #[test]
    fn test_population_clamped_to_caps() {
        let config = EngineConfig::from_toml_str("[population]\nrain = 999999\nstars = 10\n").unwrap();
        assert_eq!(config.population.rain, population::RAIN_COUNT);
        assert_eq!(config.population.stars, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("pixel_ratio = 0.0"),
            Err(EngineError::InvalidConfig { field: "pixel_ratio", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[camera]\nznear = 5.0\nzfar = 1.0\n"),
            Err(EngineError::InvalidConfig { field: "camera.zfar", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("pixel_ratio = \"big\""),
            Err(EngineError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lightning]\nmin_interval_ms = 1000\ninterval_jitter_ms = 0").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.lightning.min_interval(), Duration::from_secs(1));
        assert_eq!(config.lightning.interval_jitter(), Duration::ZERO);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigIo { .. }));
    }
}
