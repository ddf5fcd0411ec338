//! Core foundation layer.
//!
//! This is the bottom layer of the localization stack with no internal
//! dependencies. All other layers depend on core.
//!
//! # Contents
//!
//! - [`types`]: Poses, covariances and hypotheses
//! - [`math`]: Angle normalization in degrees and radians
//! - [`random`]: Seeded generators shared by the filter and clusterer

pub mod math;
pub mod random;
pub mod types;
