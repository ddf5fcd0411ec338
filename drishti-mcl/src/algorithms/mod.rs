//! Core localization algorithms layer.
//!
//! # Contents
//!
//! - [`mapping`]: Occupancy grid map, PGM loading and ray casting
//! - [`localization`]: Sensor model, motion model and particle filter
//! - [`clustering`]: EM reduction of the particle cloud to pose hypotheses

pub mod clustering;
pub mod localization;
pub mod mapping;
