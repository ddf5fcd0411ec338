//! Range sensor mounting geometry.
//!
//! A range sensor is a fixed set of beams, each with a mounting pose in the
//! robot frame. The sensor model only needs those poses, so sonar rings and
//! laser fans are both reduced to [`RangeSensor::beam_poses`].

use serde::{Deserialize, Serialize};

use crate::core::types::Pose;

/// Sonar ring: one transducer per mounting pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SonarGeometry {
    pub mounts: Vec<Pose>,
}

impl SonarGeometry {
    /// Explicit mounting poses.
    pub fn new(mounts: Vec<Pose>) -> Self {
        Self { mounts }
    }

    /// `count` transducers at the robot centre, evenly spaced in heading.
    pub fn ring(count: usize) -> Self {
        let step = if count > 0 { 360.0 / count as f64 } else { 0.0 };
        let mounts = (0..count)
            .map(|i| Pose::new(0.0, 0.0, i as f64 * step))
            .collect();
        Self { mounts }
    }
}

/// Scanning laser: `num_ranges` beams fanned across `fov` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaserGeometry {
    /// Laser pose in the robot frame; its heading is the fan centre.
    pub mount: Pose,
    /// Field of view (degrees).
    pub fov: f64,
    pub num_ranges: usize,
}

impl LaserGeometry {
    pub fn new(mount: Pose, fov: f64, num_ranges: usize) -> Self {
        Self {
            mount,
            fov,
            num_ranges,
        }
    }

    /// Heading of beam `index` relative to the robot.
    ///
    /// Beams run counter-clockwise from `-fov/2` to `+fov/2` around the mount
    /// heading. A single-beam laser points along the mount heading.
    pub fn beam_heading(&self, index: usize) -> f64 {
        if self.num_ranges <= 1 {
            return self.mount.heading;
        }
        let step = self.fov / (self.num_ranges - 1) as f64;
        self.mount.heading - self.fov / 2.0 + index as f64 * step
    }
}

/// Range sensor consumed by the localization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeSensor {
    Sonar(SonarGeometry),
    Laser(LaserGeometry),
}

impl RangeSensor {
    /// Number of readings per scan.
    pub fn num_ranges(&self) -> usize {
        match self {
            RangeSensor::Sonar(sonar) => sonar.mounts.len(),
            RangeSensor::Laser(laser) => laser.num_ranges,
        }
    }

    /// Mounting pose of every beam in the robot frame, in scan order.
    pub fn beam_poses(&self) -> Vec<Pose> {
        match self {
            RangeSensor::Sonar(sonar) => sonar.mounts.clone(),
            RangeSensor::Laser(laser) => (0..laser.num_ranges)
                .map(|i| Pose::new(laser.mount.x, laser.mount.y, laser.beam_heading(i)))
                .collect(),
        }
    }

    /// Short name used in logs and configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            RangeSensor::Sonar(_) => "sonar",
            RangeSensor::Laser(_) => "laser",
        }
    }
}
