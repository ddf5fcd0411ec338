//! Static occupancy grid used as the localization world model.
//!
//! Cells hold raw graymap values. A value below the occupancy threshold is a
//! wall; anything else is free space.
//!
//! # Coordinate System
//!
//! ```text
//!   y (native units, up)
//!   ^
//!   |  image row 0      <- top of the PGM file
//!   |  ...
//!   |  image row h-1    <- grid row j = 0
//!   +----------------------> x (native units)
//! ```
//!
//! Grid row `j` lives at image row `height - 1 - j`. Cell `(i, j)` covers the
//! native-unit square centred on `(i * cell_size, j * cell_size)`.

mod pgm;
mod raycast;
mod tile;

pub use pgm::{RawImage, is_compressed, parse_pgm, read_pgm, write_pgm};
#[cfg(feature = "gzip")]
pub use pgm::write_pgm_gz;
pub use tile::{MapInfo, MapTile};

use std::path::Path;

use log::info;

use super::RangeMap;
use crate::core::types::Pose;
use crate::error::MapError;

/// Immutable occupancy grid with a ray-cast range estimator.
#[derive(Debug, Clone)]
pub struct GridMap {
    width: u32,
    height: u32,
    /// Native units per cell.
    cell_size: f64,
    /// Raw values in image order (top row first).
    cells: Vec<u8>,
    occupancy_threshold: u8,
    max_range: f64,
}

impl GridMap {
    /// Load a PGM (optionally `.gz`) occupancy map.
    ///
    /// `pixels_per_unit` is the number of map pixels per native unit, so one
    /// cell spans `1 / pixels_per_unit` native units.
    pub fn load(
        path: impl AsRef<Path>,
        pixels_per_unit: f64,
        occupancy_threshold: u8,
        max_range: f64,
    ) -> Result<Self, MapError> {
        let path = path.as_ref();
        if !(pixels_per_unit > 0.0 && pixels_per_unit.is_finite()) {
            return Err(MapError::BadHeader(format!(
                "pixels_per_unit must be positive, got {}",
                pixels_per_unit
            )));
        }

        let image = read_pgm(path)?;
        let map = Self::from_cells(
            image.width,
            image.height,
            1.0 / pixels_per_unit,
            image.pixels,
            occupancy_threshold,
            max_range,
        )?;

        info!(
            "Loaded map {}: {}x{} cells, {:.3} units/cell, threshold {}",
            path.display(),
            map.width,
            map.height,
            map.cell_size,
            map.occupancy_threshold
        );
        Ok(map)
    }

    /// Build a map from raw values in image order (top row first).
    pub fn from_cells(
        width: u32,
        height: u32,
        cell_size: f64,
        cells: Vec<u8>,
        occupancy_threshold: u8,
        max_range: f64,
    ) -> Result<Self, MapError> {
        let expected = width as usize * height as usize;
        if cells.len() < expected {
            return Err(MapError::Truncated {
                expected,
                actual: cells.len(),
            });
        }
        if width == 0 || height == 0 || !(cell_size > 0.0) {
            return Err(MapError::BadHeader(format!(
                "invalid geometry {}x{} @ {}",
                width, height, cell_size
            )));
        }

        let mut cells = cells;
        cells.truncate(expected);
        Ok(Self {
            width,
            height,
            cell_size,
            cells,
            occupancy_threshold,
            max_range,
        })
    }

    /// Build a map by evaluating `value(i, j)` for every grid cell.
    ///
    /// `j` counts up from the bottom row.
    pub fn from_fn(
        width: u32,
        height: u32,
        cell_size: f64,
        occupancy_threshold: u8,
        max_range: f64,
        mut value: impl FnMut(u32, u32) -> u8,
    ) -> Result<Self, MapError> {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            let j = height - 1 - row;
            for i in 0..width {
                cells.push(value(i, j));
            }
        }
        Self::from_cells(width, height, cell_size, cells, occupancy_threshold, max_range)
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn occupancy_threshold(&self) -> u8 {
        self.occupancy_threshold
    }

    /// Range returned when no wall is hit.
    #[inline]
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Same grid with a different ray-cast range cap.
    pub fn with_max_range(mut self, max_range: f64) -> Self {
        self.max_range = max_range;
        self
    }

    /// Map size in native units.
    #[inline]
    pub fn extent(&self) -> (f64, f64) {
        (
            self.width as f64 * self.cell_size,
            self.height as f64 * self.cell_size,
        )
    }

    /// True when the pose position lies inside the map extent.
    #[inline]
    pub fn contains(&self, pose: &Pose) -> bool {
        let (w, h) = self.extent();
        pose.x >= 0.0 && pose.y >= 0.0 && pose.x < w && pose.y < h
    }

    /// Index into `cells` for grid cell `(i, j)`, if inside the grid.
    #[inline]
    fn index(&self, i: i64, j: i64) -> Option<usize> {
        if i < 0 || j < 0 || i >= self.width as i64 || j >= self.height as i64 {
            return None;
        }
        let row = self.height as i64 - 1 - j;
        Some((row * self.width as i64 + i) as usize)
    }

    /// Raw value of grid cell `(i, j)`.
    #[inline]
    pub fn value(&self, i: i64, j: i64) -> Option<u8> {
        self.index(i, j).map(|idx| self.cells[idx])
    }

    /// True when cell `(i, j)` is a wall. Cells outside the grid count as
    /// walls.
    #[inline]
    pub fn is_occupied(&self, i: i64, j: i64) -> bool {
        self.value(i, j)
            .is_none_or(|v| v < self.occupancy_threshold)
    }

    /// Grid cell nearest to a native-unit position.
    #[inline]
    pub fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size + 0.5).floor() as i64,
            (y / self.cell_size + 0.5).floor() as i64,
        )
    }

    /// Raw values in image order.
    pub fn raw_cells(&self) -> &[u8] {
        &self.cells
    }

    /// Copy of the map as a graymap image, suitable for [`write_pgm`].
    pub fn to_image(&self) -> RawImage {
        RawImage {
            width: self.width,
            height: self.height,
            max_gray: 255,
            pixels: self.cells.clone(),
        }
    }
}

impl RangeMap for GridMap {
    #[inline]
    fn estimate_range(&self, from: &Pose) -> f64 {
        GridMap::estimate_range(self, from)
    }

    #[inline]
    fn contains(&self, pose: &Pose) -> bool {
        GridMap::contains(self, pose)
    }

    #[inline]
    fn extent(&self) -> (f64, f64) {
        GridMap::extent(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREE: u8 = 255;
    const WALL: u8 = 0;

    #[test]
    fn test_row_flip() {
        // 2x2 image: top row [A, B], bottom row [C, D]
        let map = GridMap::from_cells(2, 2, 1.0, vec![10, 20, 30, 40], 5, 10.0).unwrap();
        assert_eq!(map.value(0, 0), Some(30));
        assert_eq!(map.value(1, 0), Some(40));
        assert_eq!(map.value(0, 1), Some(10));
        assert_eq!(map.value(1, 1), Some(20));
        assert_eq!(map.value(2, 0), None);
        assert_eq!(map.value(0, -1), None);
    }

    #[test]
    fn test_from_fn_matches_grid_coordinates() {
        let map = GridMap::from_fn(4, 3, 1.0, 128, 10.0, |i, j| {
            if i == 3 && j == 0 { WALL } else { FREE }
        })
        .unwrap();
        assert!(map.is_occupied(3, 0));
        assert!(!map.is_occupied(3, 2));
        // Bottom-right pixel of the image
        assert_eq!(map.raw_cells()[11], WALL);
    }

    #[test]
    fn test_outside_is_occupied() {
        let map = GridMap::from_fn(3, 3, 1.0, 128, 10.0, |_, _| FREE).unwrap();
        assert!(map.is_occupied(-1, 0));
        assert!(map.is_occupied(0, 3));
        assert!(!map.is_occupied(1, 1));
    }

    #[test]
    fn test_extent_and_contains() {
        let map = GridMap::from_fn(60, 50, 10.0, 240, 1000.0, |_, _| FREE).unwrap();
        assert_eq!(map.extent(), (600.0, 500.0));
        assert!(map.contains(&Pose::new(0.0, 0.0, 0.0)));
        assert!(map.contains(&Pose::new(599.9, 499.9, 0.0)));
        assert!(!map.contains(&Pose::new(600.0, 10.0, 0.0)));
        assert!(!map.contains(&Pose::new(10.0, -0.1, 0.0)));
    }

    #[test]
    fn test_cell_of_rounds_to_nearest() {
        let map = GridMap::from_fn(10, 10, 10.0, 240, 100.0, |_, _| FREE).unwrap();
        assert_eq!(map.cell_of(14.9, 15.0), (1, 2));
        assert_eq!(map.cell_of(-4.0, 0.0), (0, 0));
        assert_eq!(map.cell_of(-6.0, 0.0), (-1, 0));
    }

    #[test]
    fn test_short_cells_rejected() {
        let result = GridMap::from_cells(4, 4, 1.0, vec![0; 15], 128, 10.0);
        assert!(matches!(
            result,
            Err(MapError::Truncated {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_load_rejects_bad_resolution() {
        let result = GridMap::load("whatever.pgm", 0.0, 240, 100.0);
        assert!(matches!(result, Err(MapError::BadHeader(_))));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.pgm");
        let original = GridMap::from_fn(8, 6, 1.0, 240, 50.0, |i, j| {
            if i == 0 || j == 5 { WALL } else { FREE }
        })
        .unwrap();
        write_pgm(&path, &original.to_image()).unwrap();

        let loaded = GridMap::load(&path, 0.5, 240, 50.0).unwrap();
        assert_eq!(loaded.cell_size(), 2.0);
        assert_eq!(loaded.raw_cells(), original.raw_cells());
        assert!(loaded.is_occupied(0, 2));
        assert!(loaded.is_occupied(3, 5));
        assert!(!loaded.is_occupied(3, 4));
    }
}
