//! Simulated robot for demos, integration tests and benchmarks.
//!
//! Drives a ground-truth pose through a [`GridMap`], producing ray-cast range
//! scans and odometry in the robot's own odometry frame (which starts at the
//! origin, not at the true pose).

use rand::Rng;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

use crate::algorithms::mapping::GridMap;
use crate::core::random::seeded_rng;
use crate::core::types::Pose;
use crate::error::MapError;
use crate::sensors::RangeSensor;

/// Robot moving through a known map with a range sensor and odometry.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    /// Ground-truth pose on the map.
    pose: Pose,
    /// Dead-reckoned pose in the odometry frame.
    odometry: Pose,
    sensor: RangeSensor,
    beams: Vec<Pose>,
    /// Std dev of additive range noise (native units).
    range_noise: f64,
    /// Std dev of odometry slip as a fraction of each motion.
    odometry_noise: f64,
    rng: SmallRng,
}

impl SimulatedRobot {
    /// Noise-free robot at `pose`. A seed of 0 seeds from entropy.
    pub fn new(pose: Pose, sensor: RangeSensor, seed: u64) -> Self {
        let beams = sensor.beam_poses();
        Self {
            pose,
            odometry: Pose::default(),
            sensor,
            beams,
            range_noise: 0.0,
            odometry_noise: 0.0,
            rng: seeded_rng(seed),
        }
    }

    /// Add Gaussian noise with `std_dev` to every range reading.
    pub fn with_range_noise(mut self, std_dev: f64) -> Self {
        self.range_noise = std_dev;
        self
    }

    /// Scale each reported motion by `1 + N(0, fraction)`.
    pub fn with_odometry_noise(mut self, fraction: f64) -> Self {
        self.odometry_noise = fraction;
        self
    }

    /// Ground-truth pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Odometry reading.
    pub fn odometry(&self) -> Pose {
        self.odometry
    }

    pub fn sensor(&self) -> &RangeSensor {
        &self.sensor
    }

    #[inline]
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * std_dev
    }

    /// One full scan from the true pose, in sensor beam order.
    pub fn scan(&mut self, map: &GridMap) -> Vec<f64> {
        let expected: Vec<f64> = self
            .beams
            .iter()
            .map(|beam| map.estimate_range(&self.pose.compose(beam)))
            .collect();
        let max_range = map.max_range();
        expected
            .into_iter()
            .map(|range| (range + self.gaussian(self.range_noise)).clamp(0.0, max_range))
            .collect()
    }

    /// Move `forward` units along the heading, then turn `turn` degrees.
    ///
    /// Returns `false` without translating when the target cell is a wall or
    /// off the map; the turn is still applied.
    pub fn drive(&mut self, map: &GridMap, forward: f64, turn: f64) -> bool {
        let h = self.pose.heading_rad();
        let target = Pose::new(
            self.pose.x + forward * h.cos(),
            self.pose.y + forward * h.sin(),
            self.pose.heading,
        );
        let (i, j) = map.cell_of(target.x, target.y);
        let moved = map.contains(&target) && !map.is_occupied(i, j);

        let travelled = if moved { forward } else { 0.0 };
        if moved {
            self.pose = target;
        }
        self.pose = Pose::normalized(self.pose.x, self.pose.y, self.pose.heading + turn);

        let reported_travel = travelled * (1.0 + self.gaussian(self.odometry_noise));
        let reported_turn = turn * (1.0 + self.gaussian(self.odometry_noise));
        let oh = self.odometry.heading_rad();
        self.odometry = Pose::normalized(
            self.odometry.x + reported_travel * oh.cos(),
            self.odometry.y + reported_travel * oh.sin(),
            self.odometry.heading + reported_turn,
        );
        moved
    }

    /// Drive straight; when blocked, turn `blocked_turn` degrees instead.
    pub fn wander(&mut self, map: &GridMap, speed: f64, blocked_turn: f64) -> bool {
        if self.drive(map, speed, 0.0) {
            true
        } else {
            self.drive(map, 0.0, blocked_turn);
            false
        }
    }
}

/// Asymmetric test room: 10000 x 6000 units at 50 units per cell.
///
/// Border walls, an L-shaped block in the lower left, a pillar right of
/// centre and a short wall stub on the top edge, so no two poses see the
/// same surroundings.
pub fn demo_map(max_range: f64) -> Result<GridMap, MapError> {
    const WIDTH: u32 = 200;
    const HEIGHT: u32 = 120;
    let wall = |i: u32, j: u32| {
        let border = i == 0 || j == 0 || i == WIDTH - 1 || j == HEIGHT - 1;
        let l_block = (30..40).contains(&i) && (20..70).contains(&j)
            || (30..80).contains(&i) && (20..30).contains(&j);
        let pillar = (130..140).contains(&i) && (50..60).contains(&j);
        let stub = (160..165).contains(&i) && (90..HEIGHT).contains(&j);
        border || l_block || pillar || stub
    };
    GridMap::from_fn(WIDTH, HEIGHT, 50.0, 240, max_range, |i, j| {
        if wall(i, j) { 0 } else { 255 }
    })
}
