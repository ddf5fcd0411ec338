//! Sensor geometry layer.
//!
//! # Contents
//!
//! - [`RangeSensor`]: sonar ring or laser fan, reduced to beam mounting poses
//! - [`BeamSelection`]: evenly spaced subset of beams used for weighting

mod geometry;
mod selection;

pub use geometry::{LaserGeometry, RangeSensor, SonarGeometry};
pub use selection::BeamSelection;
