//! Map metadata and raw sub-tiles for administrative queries.

use serde::{Deserialize, Serialize};

use super::GridMap;
use crate::error::MapError;

/// Map dimensions and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
    /// Native units per cell
    pub cell_size: f64,
    /// Cells per native unit
    pub pixels_per_unit: f64,
    pub occupancy_threshold: u8,
}

/// Rectangular block of raw occupancy values.
///
/// `cells` is row-major starting at grid row `y` (bottom of the block), so
/// `cells[r * width + c]` is grid cell `(x + c, y + r)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<u8>,
}

impl MapTile {
    /// Raw value at tile-local `(col, row)`.
    pub fn get(&self, col: u32, row: u32) -> Option<u8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }
}

impl GridMap {
    /// Dimensions and resolution.
    pub fn info(&self) -> MapInfo {
        MapInfo {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            pixels_per_unit: 1.0 / self.cell_size,
            occupancy_threshold: self.occupancy_threshold,
        }
    }

    /// Copy out the `width` x `height` block whose lower-left cell is `(x, y)`.
    pub fn tile(&self, x: u32, y: u32, width: u32, height: u32) -> Result<MapTile, MapError> {
        let fits = x
            .checked_add(width)
            .is_some_and(|right| right <= self.width)
            && y.checked_add(height)
                .is_some_and(|top| top <= self.height);
        if !fits {
            return Err(MapError::TileOutOfBounds {
                x,
                y,
                width,
                height,
                map_width: self.width,
                map_height: self.height,
            });
        }

        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for j in y..y + height {
            // Image rows run top-down; each grid row is contiguous
            let row = (self.height - 1 - j) as usize;
            let start = row * self.width as usize + x as usize;
            cells.extend_from_slice(&self.cells[start..start + width as usize]);
        }

        Ok(MapTile {
            x,
            y,
            width,
            height,
            cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_map() -> GridMap {
        GridMap::from_fn(5, 4, 2.0, 128, 50.0, |i, j| (j * 10 + i) as u8).unwrap()
    }

    #[test]
    fn test_info() {
        let info = numbered_map().info();
        assert_eq!((info.width, info.height), (5, 4));
        assert_eq!(info.cell_size, 2.0);
        assert_eq!(info.pixels_per_unit, 0.5);
        assert_eq!(info.occupancy_threshold, 128);
    }

    #[test]
    fn test_tile_uses_grid_coordinates() {
        let tile = numbered_map().tile(1, 2, 3, 2).unwrap();
        assert_eq!(tile.cells, vec![21, 22, 23, 31, 32, 33]);
        assert_eq!(tile.get(0, 1), Some(31));
        assert_eq!(tile.get(3, 0), None);
    }

    #[test]
    fn test_full_tile() {
        let map = numbered_map();
        let tile = map.tile(0, 0, 5, 4).unwrap();
        assert_eq!(tile.cells.len(), 20);
        assert_eq!(tile.get(4, 3), Some(34));
    }

    #[test]
    fn test_tile_out_of_bounds() {
        let map = numbered_map();
        assert!(matches!(
            map.tile(3, 0, 3, 1),
            Err(MapError::TileOutOfBounds { .. })
        ));
        assert!(matches!(
            map.tile(0, 3, 1, 2),
            Err(MapError::TileOutOfBounds { .. })
        ));
        assert!(matches!(
            map.tile(u32::MAX, 0, 2, 1),
            Err(MapError::TileOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_tile() {
        let tile = numbered_map().tile(5, 4, 0, 0).unwrap();
        assert!(tile.cells.is_empty());
    }
}
