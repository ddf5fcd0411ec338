//! Ray casting for expected range readings.
//!
//! # Algorithm
//!
//! The ray advances one cell at a time along its dominant axis: the axis
//! whose |cos| or |sin| is at least 1/√2, tested in the order +x, +y, -x, -y.
//! Comparing |cos| with |sin| directly keeps exact diagonals on a branch.
//! The minor coordinate moves by `cell * tan` (or `cell / tan`) per step and
//! is re-snapped to the nearest cell. Each free cell adds
//! `cell / |cos|` (or `cell / |sin|`) to the travelled distance.

use super::GridMap;
use crate::core::types::Pose;

/// Axis the ray steps along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl GridMap {
    /// Distance from `from` along `from.heading` to the first wall, capped at
    /// `max_range`.
    ///
    /// Returns 0 when `from` does not round to a cell inside the grid.
    pub fn estimate_range(&self, from: &Pose) -> f64 {
        let (i, j) = self.cell_of(from.x, from.y);
        if self.value(i, j).is_none() {
            return 0.0;
        }

        let (sin_h, cos_h) = from.heading_rad().sin_cos();

        let x_dominant = cos_h.abs() >= sin_h.abs();
        let y_dominant = sin_h.abs() >= cos_h.abs();

        let distance = if x_dominant && cos_h > 0.0 {
            self.march(Axis::X, i, j, from.y, 1, sin_h / cos_h, cos_h)
        } else if y_dominant && sin_h > 0.0 {
            self.march(Axis::Y, j, i, from.x, 1, cos_h / sin_h, sin_h)
        } else if x_dominant {
            self.march(Axis::X, i, j, from.y, -1, sin_h / cos_h, cos_h)
        } else {
            self.march(Axis::Y, j, i, from.x, -1, cos_h / sin_h, sin_h)
        };

        distance.min(self.max_range)
    }

    /// Step along `axis` from major cell `major` in direction `step`.
    ///
    /// `minor_coord` is the native-unit coordinate on the other axis,
    /// `slope` is d(minor)/d(major) and `axis_trig` is cos (X) or sin (Y)
    /// of the heading.
    #[allow(clippy::too_many_arguments)]
    fn march(
        &self,
        axis: Axis,
        major: i64,
        mut minor: i64,
        mut minor_coord: f64,
        step: i64,
        slope: f64,
        axis_trig: f64,
    ) -> f64 {
        let cell = self.cell_size;
        let steps = (self.max_range * axis_trig.abs() / cell) as i64;
        let per_cell = (cell / axis_trig).abs();
        let minor_delta = step as f64 * cell * slope;

        let mut distance = 0.0;
        for k in 0..=steps {
            let m = major + k * step;
            let (ci, cj) = match axis {
                Axis::X => (m, minor),
                Axis::Y => (minor, m),
            };
            if self.is_occupied(ci, cj) {
                break;
            }
            distance += per_cell;
            minor_coord += minor_delta;
            minor = (minor_coord / cell + 0.5).floor() as i64;
        }
        distance
    }
}
