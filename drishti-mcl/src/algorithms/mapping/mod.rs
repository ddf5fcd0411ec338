//! World model for localization.
//!
//! # Components
//!
//! - [`GridMap`]: static occupancy grid loaded from a PGM image, with a
//!   ray-cast range estimator
//! - [`RangeMap`]: the queries the sensor model and particle filter need
//! - [`MapInfo`] / [`MapTile`]: metadata and raw sub-rectangles
//!
//! # Example
//!
//! ```ignore
//! use drishti_mcl::algorithms::mapping::GridMap;
//! use drishti_mcl::Pose;
//!
//! let map = GridMap::load("maps/cave.pgm.gz", 0.01, 240, 5000.0)?;
//! let range = map.estimate_range(&Pose::new(1000.0, 2500.0, 90.0));
//! ```

mod grid_map;

pub use grid_map::{
    GridMap, MapInfo, MapTile, RawImage, is_compressed, parse_pgm, read_pgm, write_pgm,
};
#[cfg(feature = "gzip")]
pub use grid_map::write_pgm_gz;

use crate::core::types::Pose;

/// Map queries used by the sensor model and particle filter.
pub trait RangeMap {
    /// Expected range reading from `from` along its heading.
    fn estimate_range(&self, from: &Pose) -> f64;

    /// True when the pose position lies on the map.
    fn contains(&self, pose: &Pose) -> bool;

    /// Map size in native units (width, height).
    fn extent(&self) -> (f64, f64);
}
