//! DrishtiMCL - Monte Carlo Localization on a known occupancy map
//!
//! # Architecture
//!
//! The crate is organized into 4 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 main / harness                      │  ← Demo + simulation
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │        (LocalizationEngine, throttle, admin)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │        (mapping, localization, clustering)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Sensor geometry
//! │            (sonar ring, laser fan)                  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │              (types, math, random)                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Per-tick data flow
//!
//! 1. Odometry unchanged since the last tick: skip the filter, re-cluster
//! 2. Resample with motion: draw ancestors by importance, move each through
//!    the odometry motion model
//! 3. Reweight: score every particle's ray-cast ranges against the scan
//! 4. Cluster: fit a Gaussian mixture of at most
//!    [`MAX_HYPOTHESES`] components to the cloud
//!
//! # Units
//!
//! Positions are in native map units (typically millimetres), headings in
//! degrees counter-clockwise from +x.
//!
//! # Example
//!
//! ```ignore
//! use drishti_mcl::{EngineConfig, LocalizationEngine, Pose};
//!
//! let config = EngineConfig::load("drishti-mcl.toml".as_ref())?;
//! let mut engine = LocalizationEngine::new(config)?;
//!
//! let hypotheses = engine.tick(&ranges, &odometry)?;
//! if let Some(best) = hypotheses.best() {
//!     println!("{:?} ({:.2})", best.mean, best.weight);
//! }
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;
pub mod error;

// ============================================================================
// Layer 2: Sensor geometry (depends on core)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Algorithms (depends on core, sensors)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 4: Localization engine (depends on all layers above)
// ============================================================================
pub mod config;
pub mod engine;

// ============================================================================
// Simulation harness (demo binary, integration tests, benches)
// ============================================================================
pub mod harness;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::math;
pub use crate::core::types::{Covariance3, Hypothesis, HypothesisSet, MAX_HYPOTHESES, Pose};

// Sensors
pub use sensors::{BeamSelection, LaserGeometry, RangeSensor, SonarGeometry};

// Algorithms - Mapping
pub use algorithms::mapping::{GridMap, MapInfo, MapTile, RangeMap};

// Algorithms - Localization
pub use algorithms::localization::{
    BeamSensorModel, MotionModel, MotionModelConfig, NoiseSampler, Particle, ParticleFilter,
    ParticleFilterConfig, ParticleFilterState, SensorModel, SensorModelConfig,
};

// Algorithms - Clustering
pub use algorithms::clustering::{ClusteringConfig, HypothesisClusterer};

// Engine
pub use config::{EngineConfig, SensorKind};
pub use engine::{AdminRequest, AdminResponse, LocalizationEngine, UpdateThrottle};
pub use error::{ConfigError, EngineError, FilterError, MapError, Result};

// Harness
pub use harness::SimulatedRobot;
