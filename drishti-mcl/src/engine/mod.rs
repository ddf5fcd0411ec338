//! Localization orchestration layer.
//!
//! Ties the map, sensor geometry, models, particle filter and clusterer into
//! a single engine driven by scan/odometry ticks.
//!
//! # Contents
//!
//! - [`LocalizationEngine`]: per-tick SIR update and hypothesis clustering
//! - [`UpdateThrottle`]: limits updates to the configured frequency
//! - [`AdminRequest`] / [`AdminResponse`]: particle count, reset, map queries

mod admin;
mod localizer;
mod throttle;

pub use admin::{AdminRequest, AdminResponse};
pub use localizer::LocalizationEngine;
pub use throttle::UpdateThrottle;
