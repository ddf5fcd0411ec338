//! Angle helpers.
//!
//! Poses carry headings in degrees, kept in [0, 360). The motion model works
//! in radians internally, so both conventions appear here.

use std::f64::consts::PI;

/// Normalize a heading in degrees to [0, 360).
///
/// # Example
/// ```
/// use drishti_mcl::core::math::normalize_degrees;
///
/// assert_eq!(normalize_degrees(370.0), 10.0);
/// assert_eq!(normalize_degrees(-90.0), 270.0);
/// ```
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Normalize an angle in radians to [-π, π].
#[inline]
pub fn normalize_radians(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Magnitude of an angle after wrapping to [-π, π].
#[inline]
pub fn wrapped_abs(angle: f64) -> f64 {
    normalize_radians(angle).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_degrees_in_range() {
        assert_relative_eq!(normalize_degrees(0.0), 0.0);
        assert_relative_eq!(normalize_degrees(359.5), 359.5);
    }

    #[test]
    fn test_normalize_degrees_wraps() {
        assert_relative_eq!(normalize_degrees(360.0), 0.0);
        assert_relative_eq!(normalize_degrees(725.0), 5.0, epsilon = 1e-9);
        assert_relative_eq!(normalize_degrees(-1.0), 359.0);
        assert_relative_eq!(normalize_degrees(-720.0), 0.0);
    }

    #[test]
    fn test_normalize_degrees_tiny_negative() {
        let a = normalize_degrees(-1e-15);
        assert!((0.0..360.0).contains(&a), "{}", a);
    }

    #[test]
    fn test_normalize_radians() {
        assert_relative_eq!(normalize_radians(3.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_radians(-3.0 * PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_radians(0.5), 0.5);
    }

    #[test]
    fn test_wrapped_abs() {
        assert_relative_eq!(wrapped_abs(-0.25), 0.25);
        assert_relative_eq!(wrapped_abs(2.0 * PI - 0.1), 0.1, epsilon = 1e-12);
    }
}
