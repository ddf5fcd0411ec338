//! 3x3 covariance matrix for pose hypotheses.

use serde::{Deserialize, Serialize};

/// Diagonal increment applied when a covariance is exactly singular.
pub const SINGULAR_EPSILON: f64 = 1e-3;

/// 3x3 symmetric covariance matrix over (x, y, heading).
///
/// Stored as row-major array: [xx, xy, xh, yx, yy, yh, hx, hy, hh]
/// where h = heading (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariance3 {
    /// Row-major 3x3 matrix data
    data: [f64; 9],
}

impl Covariance3 {
    /// Create a zero covariance matrix.
    #[inline]
    pub fn zero() -> Self {
        Self { data: [0.0; 9] }
    }

    /// Create a diagonal covariance matrix from variances.
    #[inline]
    pub fn diagonal(xx: f64, yy: f64, hh: f64) -> Self {
        Self {
            data: [xx, 0.0, 0.0, 0.0, yy, 0.0, 0.0, 0.0, hh],
        }
    }

    /// Create from the six unique entries of a symmetric matrix.
    #[inline]
    pub fn symmetric(xx: f64, xy: f64, xh: f64, yy: f64, yh: f64, hh: f64) -> Self {
        Self {
            data: [xx, xy, xh, xy, yy, yh, xh, yh, hh],
        }
    }

    /// Create from row-major array.
    #[inline]
    pub fn from_array(data: [f64; 9]) -> Self {
        Self { data }
    }

    /// Element at (row, col). Both indices must be < 3.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * 3 + col]
    }

    /// Variance of x (element [0,0]).
    #[inline]
    pub fn var_x(&self) -> f64 {
        self.data[0]
    }

    /// Variance of y (element [1,1]).
    #[inline]
    pub fn var_y(&self) -> f64 {
        self.data[4]
    }

    /// Variance of heading (element [2,2]).
    #[inline]
    pub fn var_heading(&self) -> f64 {
        self.data[8]
    }

    /// Raw data as slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64; 9] {
        &self.data
    }

    /// True when every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Closed-form cofactor determinant (symmetric input assumed).
    #[inline]
    pub fn raw_determinant(&self) -> f64 {
        let [a, b, c, _, d, e, _, _, f] = self.data;
        a * d * f - a * e * e - b * b * f + 2.0 * b * c * e - c * c * d
    }

    /// Matrix with its diagonal bumped until the determinant is non-zero,
    /// together with that determinant.
    ///
    /// A NaN determinant is returned as-is.
    pub fn regularized(&self) -> (Covariance3, f64) {
        let mut m = *self;
        let mut det = m.raw_determinant();
        while det == 0.0 {
            m.data[0] += SINGULAR_EPSILON;
            m.data[4] += SINGULAR_EPSILON;
            m.data[8] += SINGULAR_EPSILON;
            det = m.raw_determinant();
        }
        (m, det)
    }

    /// Determinant of the regularized matrix. Never exactly zero.
    pub fn determinant(&self) -> f64 {
        self.regularized().1
    }

    /// Inverse of the regularized matrix, returned with its determinant.
    pub fn inverse_with_determinant(&self) -> (Covariance3, f64) {
        let (m, det) = self.regularized();
        let [a, b, c, _, d, e, _, _, f] = m.data;

        let i00 = (d * f - e * e) / det;
        let i01 = (c * e - b * f) / det;
        let i02 = (b * e - c * d) / det;
        let i11 = (a * f - c * c) / det;
        let i12 = (b * c - a * e) / det;
        let i22 = (a * d - b * b) / det;

        (Covariance3::symmetric(i00, i01, i02, i11, i12, i22), det)
    }

    /// Inverse of the regularized matrix.
    pub fn inverse(&self) -> Covariance3 {
        self.inverse_with_determinant().0
    }

    /// Quadratic form vᵀ M v.
    #[inline]
    pub fn quadratic_form(&self, v: &[f64; 3]) -> f64 {
        let mut sum = 0.0;
        for r in 0..3 {
            for c in 0..3 {
                sum += v[r] * self.data[r * 3 + c] * v[c];
            }
        }
        sum
    }
}

impl Default for Covariance3 {
    fn default() -> Self {
        Self::zero()
    }
}
