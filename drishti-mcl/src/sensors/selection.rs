//! Beam subsampling.
//!
//! Evaluating every beam of a dense laser is rarely worth it for MCL; a
//! handful of evenly spread beams carries most of the information.

use crate::core::types::Pose;

use super::RangeSensor;

/// Subset of a sensor's beams used for weighting.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamSelection {
    /// Scan indices of the selected beams, ascending.
    indices: Vec<usize>,
    /// Mounting pose of each selected beam.
    poses: Vec<Pose>,
    /// Readings per full scan.
    scan_len: usize,
}

impl BeamSelection {
    /// Select `num_samples` evenly spaced beams. `0` (or more than the sensor
    /// provides) keeps every beam.
    pub fn new(sensor: &RangeSensor, num_samples: usize) -> Self {
        let all = sensor.beam_poses();
        let n = all.len();

        let indices: Vec<usize> = if num_samples == 0 || num_samples >= n {
            (0..n).collect()
        } else {
            (0..num_samples).map(|k| k * n / num_samples).collect()
        };
        let poses = indices.iter().map(|&i| all[i]).collect();

        Self {
            indices,
            poses,
            scan_len: n,
        }
    }

    /// Number of selected beams.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Readings expected per full scan.
    pub fn scan_len(&self) -> usize {
        self.scan_len
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Mounting poses of the selected beams.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Pick the selected readings out of a full scan.
    ///
    /// Returns `None` when the scan is shorter than the sensor.
    pub fn select(&self, scan: &[f64]) -> Option<Vec<f64>> {
        if scan.len() < self.scan_len {
            return None;
        }
        Some(self.indices.iter().map(|&i| scan[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{LaserGeometry, SonarGeometry};

    #[test]
    fn test_zero_keeps_everything() {
        let sensor = RangeSensor::Sonar(SonarGeometry::ring(16));
        let selection = BeamSelection::new(&sensor, 0);
        assert_eq!(selection.len(), 16);
        assert_eq!(selection.poses(), sensor.beam_poses().as_slice());
    }

    #[test]
    fn test_oversized_request_keeps_everything() {
        let sensor = RangeSensor::Sonar(SonarGeometry::ring(4));
        assert_eq!(BeamSelection::new(&sensor, 10).len(), 4);
    }

    #[test]
    fn test_even_subsampling() {
        let laser = LaserGeometry::new(Pose::default(), 180.0, 181);
        let selection = BeamSelection::new(&RangeSensor::Laser(laser), 4);
        assert_eq!(selection.indices(), &[0, 45, 90, 135]);
        assert_eq!(selection.scan_len(), 181);
        assert_eq!(selection.poses()[2].heading, 0.0);
    }

    #[test]
    fn test_select() {
        let sensor = RangeSensor::Sonar(SonarGeometry::ring(6));
        let selection = BeamSelection::new(&sensor, 3);
        let scan = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        assert_eq!(selection.select(&scan), Some(vec![10.0, 12.0, 14.0]));
        assert_eq!(selection.select(&scan[..5]), None);
    }
}
