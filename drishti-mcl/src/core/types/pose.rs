//! Pose type for planar localization.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_degrees;

/// Robot (or sensor) pose on the map.
///
/// Position is in native map units (the map's pixel spacing scaled by
/// `pixels_per_unit`); heading is in degrees, 0° along +x, counter-clockwise
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// X position in native units
    pub x: f64,
    /// Y position in native units
    pub y: f64,
    /// Heading in degrees
    pub heading: f64,
}

impl Pose {
    /// Create a pose. The heading is stored as given.
    #[inline]
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Create a pose with the heading normalized to [0, 360).
    #[inline]
    pub fn normalized(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_degrees(heading),
        }
    }

    /// Heading in radians.
    #[inline]
    pub fn heading_rad(&self) -> f64 {
        self.heading.to_radians()
    }

    /// Express a pose given in this pose's local frame in the global frame.
    ///
    /// ```text
    /// C = A ⊕ B:
    ///   C.x = A.x + B.x * cos(A.h) - B.y * sin(A.h)
    ///   C.y = A.y + B.x * sin(A.h) + B.y * cos(A.h)
    ///   C.h = A.h + B.h
    /// ```
    ///
    /// The heading is not normalized; ray casting only needs its direction.
    #[inline]
    pub fn compose(&self, local: &Pose) -> Pose {
        let (sin_h, cos_h) = self.heading_rad().sin_cos();
        Pose {
            x: self.x + local.x * cos_h - local.y * sin_h,
            y: self.y + local.x * sin_h + local.y * cos_h,
            heading: self.heading + local.heading,
        }
    }

    /// Position and heading as a 3-vector (used by clustering).
    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.heading]
    }

    /// Build a pose from a 3-vector without normalizing.
    #[inline]
    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// True when every component is bit-identical.
    ///
    /// The engine uses this for its no-motion check. Plain `==` would treat
    /// `0.0` and `-0.0` as equal, which the odometry source never produces
    /// for an unchanged reading.
    #[inline]
    pub fn bit_eq(&self, other: &Pose) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.heading.to_bits() == other.heading.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compose_identity() {
        let p = Pose::new(10.0, 20.0, 45.0);
        let r = p.compose(&Pose::default());
        assert_relative_eq!(r.x, 10.0);
        assert_relative_eq!(r.y, 20.0);
        assert_relative_eq!(r.heading, 45.0);
    }

    #[test]
    fn test_compose_rotated_mount() {
        // Sensor mounted 100 units ahead, robot facing +y
        let robot = Pose::new(0.0, 0.0, 90.0);
        let mount = Pose::new(100.0, 0.0, 30.0);
        let r = robot.compose(&mount);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(r.y, 100.0, epsilon = 1e-9);
        assert_relative_eq!(r.heading, 120.0);
    }

    #[test]
    fn test_normalized() {
        let p = Pose::normalized(1.0, 2.0, -30.0);
        assert_relative_eq!(p.heading, 330.0);
    }

    #[test]
    fn test_bit_eq() {
        let a = Pose::new(1.0, 2.0, 3.0);
        assert!(a.bit_eq(&Pose::new(1.0, 2.0, 3.0)));
        assert!(!a.bit_eq(&Pose::new(1.0, 2.0, 3.0 + 1e-12)));
        assert!(!Pose::new(0.0, 0.0, 0.0).bit_eq(&Pose::new(-0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_array_roundtrip() {
        let p = Pose::new(1.5, -2.0, 270.0);
        assert_eq!(Pose::from_array(p.to_array()), p);
    }
}
