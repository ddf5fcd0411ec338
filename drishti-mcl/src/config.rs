//! Configuration loading for drishti-mcl
//!
//! All sections are optional; a missing key takes its default.
//!
//! ```toml
//! [filter]
//! num_particles = 1000
//! update_frequency = 10.0
//! seed = 0                      # 0 = seed from entropy
//!
//! [sensor]
//! type = "sonar"                # or "laser"
//! max_range = 5000.0
//! num_ranges = 16
//! num_samples = 0               # 0 = use every beam
//!
//! [map]
//! file = "map.pgm"
//! pixels_per_unit = 0.01
//! occupancy_threshold = 240
//!
//! [sensor_model]
//! measurement_noise_std_dev = 300.0
//!
//! [motion_model]
//! alpha1 = 0.01
//!
//! [clustering]
//! iterations = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::algorithms::clustering::ClusteringConfig;
use crate::algorithms::localization::{MotionModelConfig, ParticleFilterConfig, SensorModelConfig};
use crate::core::types::Pose;
use crate::error::ConfigError;
use crate::sensors::{LaserGeometry, RangeSensor, SonarGeometry};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filter: FilterSection,
    pub sensor: SensorSection,
    pub map: MapSection,
    pub sensor_model: SensorModelConfig,
    pub motion_model: MotionModelConfig,
    pub clustering: ClusteringConfig,
}

/// Particle population and scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Particles per generation.
    /// Default: 1000
    pub num_particles: usize,

    /// Filter updates per second of simulation time.
    /// Default: 10
    pub update_frequency: f64,

    /// RNG seed; 0 seeds from entropy.
    pub seed: u64,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            num_particles: 1000,
            update_frequency: 10.0,
            seed: 0,
        }
    }
}

/// Which kind of range sensor feeds the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[default]
    Sonar,
    Laser,
}

/// Range sensor and odometry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSection {
    #[serde(rename = "type")]
    pub kind: SensorKind,

    /// Index of the range device on the robot.
    pub index: u32,

    /// Maximum range (native units). Also used by the sensor model.
    /// Default: 5000
    pub max_range: f64,

    /// Beams per scan. Ignored for sonar when `mounts` is given.
    /// Default: 16
    pub num_ranges: usize,

    /// Beams used for weighting; 0 uses all of them.
    pub num_samples: usize,

    /// Laser field of view (degrees).
    /// Default: 180
    pub fov: f64,

    /// Laser mounting pose in the robot frame.
    pub laser_mount: Pose,

    /// Explicit sonar transducer poses. Empty means an evenly spaced ring.
    pub mounts: Vec<Pose>,

    /// Index of the odometry device on the robot.
    pub motion_index: u32,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            kind: SensorKind::Sonar,
            index: 0,
            max_range: 5000.0,
            num_ranges: 16,
            num_samples: 0,
            fov: 180.0,
            laser_mount: Pose::default(),
            mounts: Vec::new(),
            motion_index: 0,
        }
    }
}

/// Occupancy map source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSection {
    /// Binary PGM, optionally gzip-compressed (`.gz`).
    pub file: PathBuf,

    /// Map pixels per native unit.
    /// Default: 0.01 (10 px/m with millimetre units)
    pub pixels_per_unit: f64,

    /// Gray values below this are walls.
    /// Default: 240
    pub occupancy_threshold: u8,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from("map.pgm"),
            pixels_per_unit: 0.01,
            occupancy_threshold: 240,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = basic_toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        }

        if self.filter.num_particles == 0 {
            return Err(ConfigError::Invalid(
                "filter.num_particles must be at least 1".to_string(),
            ));
        }
        positive("filter.update_frequency", self.filter.update_frequency)?;
        positive("sensor.max_range", self.sensor.max_range)?;
        positive("map.pixels_per_unit", self.map.pixels_per_unit)?;

        if self.range_sensor().num_ranges() == 0 {
            return Err(ConfigError::Invalid(
                "sensor must have at least one beam".to_string(),
            ));
        }
        let fov = self.sensor.fov;
        if self.sensor.kind == SensorKind::Laser && !(fov > 0.0 && fov <= 360.0) {
            return Err(ConfigError::Invalid(format!(
                "sensor.fov must be in (0, 360], got {}",
                self.sensor.fov
            )));
        }

        self.effective_sensor_model().validate()?;

        let motion = &self.motion_model;
        for (name, alpha) in [
            ("alpha1", motion.alpha1),
            ("alpha2", motion.alpha2),
            ("alpha3", motion.alpha3),
            ("alpha4", motion.alpha4),
        ] {
            if !(alpha >= 0.0 && alpha.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "motion_model.{} must be non-negative, got {}",
                    name, alpha
                )));
            }
        }

        positive(
            "clustering.max_position_variance",
            self.clustering.max_position_variance,
        )?;
        Ok(())
    }

    /// Sensor geometry described by the `[sensor]` section.
    pub fn range_sensor(&self) -> RangeSensor {
        let sensor = &self.sensor;
        match sensor.kind {
            SensorKind::Sonar if sensor.mounts.is_empty() => {
                RangeSensor::Sonar(SonarGeometry::ring(sensor.num_ranges))
            }
            SensorKind::Sonar => RangeSensor::Sonar(SonarGeometry::new(sensor.mounts.clone())),
            SensorKind::Laser => RangeSensor::Laser(LaserGeometry::new(
                sensor.laser_mount,
                sensor.fov,
                sensor.num_ranges,
            )),
        }
    }

    /// Sensor model parameters with the sensor's maximum range applied.
    ///
    /// `[sensor] max_range` wins over a differing `[sensor_model] max_range`.
    pub fn sensor_model_config(&self) -> SensorModelConfig {
        let requested = self.sensor_model.max_range;
        if requested != self.sensor.max_range && requested != SensorModelConfig::default().max_range
        {
            log::warn!(
                "sensor_model.max_range {} ignored; using sensor.max_range {}",
                requested,
                self.sensor.max_range
            );
        }
        self.effective_sensor_model()
    }

    fn effective_sensor_model(&self) -> SensorModelConfig {
        SensorModelConfig {
            max_range: self.sensor.max_range,
            ..self.sensor_model
        }
    }

    pub fn particle_filter_config(&self) -> ParticleFilterConfig {
        ParticleFilterConfig {
            num_particles: self.filter.num_particles,
            seed: self.filter.seed,
        }
    }
}
