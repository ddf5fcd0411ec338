//! Localization module.
//!
//! Provides Monte Carlo Localization (MCL) for robot pose estimation
//! within a known map.
//!
//! # Components
//!
//! - [`MotionModel`]: Odometry-based motion model with configurable noise
//! - [`BeamSensorModel`]: Four-part beam mixture with an optional lookup table
//! - [`ParticleFilter`]: SIR population with cumulative-weight resampling
//!
//! # Example
//!
//! ```ignore
//! use drishti_mcl::algorithms::localization::*;
//!
//! let motion = MotionModel::new(MotionModelConfig::default());
//! let sensor = BeamSensorModel::new(SensorModelConfig::default(), beams)?;
//! let mut filter = ParticleFilter::new(ParticleFilterConfig::default(), &map);
//!
//! // One SIR generation per odometry change
//! filter.update(&motion, &sensor, &last_odom, &odom, &ranges, &map)?;
//! ```

mod motion_model;
mod particle_filter;
mod sensor_model;

pub use motion_model::{MotionModel, MotionModelConfig, NoiseSampler, OdometryDelta};
pub use particle_filter::{Particle, ParticleFilter, ParticleFilterConfig, ParticleFilterState};
pub use sensor_model::{
    BeamSensorModel, MAX_NORMALIZER_RANGE, MAX_TABLE_BUCKETS, SensorModel, SensorModelConfig,
};
