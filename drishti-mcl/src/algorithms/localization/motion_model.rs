//! Odometry-based motion model for the particle filter.
//!
//! Implements `sample_motion_model_odometry` from Probabilistic Robotics
//! (Thrun et al.). The odometry change between two readings is decomposed
//! into:
//! 1. Initial rotation to face the target
//! 2. Translation toward the target
//! 3. Final rotation to match the target heading
//!
//! Each component is perturbed with noise scaled by the alpha parameters and
//! the result is applied in the particle's own frame.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::core::math::wrapped_abs;
use crate::core::types::Pose;

/// Scalar noise generator for motion perturbation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseSampler {
    /// `b · (Σ₁₂ U(0,1) − 6)`: approximately normal with std dev `b`.
    #[default]
    IrwinHall,
    /// `(b + 100) / 6 · Σ₁₂ (2U − 1)`.
    ///
    /// Reproduces the sampler of older MCL deployments, including its
    /// constant `+100` offset. Only useful for comparing against recorded
    /// runs.
    LegacyOffset,
}

impl NoiseSampler {
    /// Draw one noise sample with scale `b`.
    pub fn draw<R: Rng + ?Sized>(&self, b: f64, unit: &Uniform<f64>, rng: &mut R) -> f64 {
        match self {
            NoiseSampler::IrwinHall => {
                let sum: f64 = (0..12).map(|_| unit.sample(rng)).sum();
                b * (sum - 6.0)
            }
            NoiseSampler::LegacyOffset => {
                let sum: f64 = (0..12).map(|_| 2.0 * unit.sample(rng) - 1.0).sum();
                (b + 100.0) / 6.0 * sum
            }
        }
    }
}

/// Configuration for the odometry motion model.
///
/// Rotations are in radians, translations in native units:
/// - `alpha1`: rotation noise from rotation
/// - `alpha2`: rotation noise from translation
/// - `alpha3`: translation noise from translation
/// - `alpha4`: translation noise from rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionModelConfig {
    /// Default: 0.01
    pub alpha1: f64,

    /// Default: 0.0002
    pub alpha2: f64,

    /// Default: 0.03
    pub alpha3: f64,

    /// Default: 0.1
    pub alpha4: f64,

    pub noise_sampler: NoiseSampler,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            alpha1: 0.01,
            alpha2: 0.0002,
            alpha3: 0.03,
            alpha4: 0.1,
            noise_sampler: NoiseSampler::IrwinHall,
        }
    }
}

impl MotionModelConfig {
    /// No noise at all: samples follow odometry exactly.
    pub fn noiseless() -> Self {
        Self {
            alpha1: 0.0,
            alpha2: 0.0,
            alpha3: 0.0,
            alpha4: 0.0,
            noise_sampler: NoiseSampler::IrwinHall,
        }
    }

    /// Create a high-noise configuration (slippery floors, poor encoders).
    pub fn high_noise() -> Self {
        Self {
            alpha1: 0.1,
            alpha2: 0.002,
            alpha3: 0.2,
            alpha4: 0.5,
            ..Default::default()
        }
    }
}

/// Odometry change as rotation, translation, rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdometryDelta {
    /// Initial rotation (radians)
    pub rot1: f64,
    /// Translation (native units)
    pub trans: f64,
    /// Final rotation (radians)
    pub rot2: f64,
}

impl OdometryDelta {
    /// Decompose the motion from `from` to `to`.
    ///
    /// A pure rotation yields `rot1 = -from.heading`; `rot1 + rot2` is still
    /// the heading change.
    pub fn between(from: &Pose, to: &Pose) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let rot1 = dy.atan2(dx) - from.heading_rad();
        let trans = dx.hypot(dy);
        let rot2 = to.heading_rad() - from.heading_rad() - rot1;
        Self { rot1, trans, rot2 }
    }
}

/// Odometry motion model for sampling particle poses.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
    unit: Uniform<f64>,
}

impl MotionModel {
    /// Create a new motion model with the given configuration.
    pub fn new(config: MotionModelConfig) -> Self {
        if config.noise_sampler == NoiseSampler::LegacyOffset {
            log::warn!(
                "Motion model uses the legacy +100 noise offset; sampled poses will be far noisier than the alpha parameters suggest"
            );
        }
        Self {
            config,
            unit: Uniform::new(0.0, 1.0),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MotionModelConfig {
        &self.config
    }

    /// Sample a posterior pose for a particle at `state` given that odometry
    /// moved from `from` to `to`.
    ///
    /// The returned heading is normalized to [0, 360).
    pub fn sample<R: Rng + ?Sized>(
        &self,
        state: &Pose,
        from: &Pose,
        to: &Pose,
        rng: &mut R,
    ) -> Pose {
        let delta = OdometryDelta::between(from, to);
        let c = &self.config;

        let abs_rot1 = wrapped_abs(delta.rot1);
        let abs_rot2 = wrapped_abs(delta.rot2);

        let rot1 = delta.rot1 + self.noise(c.alpha1 * abs_rot1 + c.alpha2 * delta.trans, rng);
        let trans =
            delta.trans + self.noise(c.alpha3 * delta.trans + c.alpha4 * (abs_rot1 + abs_rot2), rng);
        let rot2 = delta.rot2 + self.noise(c.alpha1 * abs_rot2 + c.alpha2 * delta.trans, rng);

        let heading = state.heading_rad() + rot1;
        Pose::normalized(
            state.x + trans * heading.cos(),
            state.y + trans * heading.sin(),
            (heading + rot2).to_degrees(),
        )
    }

    #[inline]
    fn noise<R: Rng + ?Sized>(&self, b: f64, rng: &mut R) -> f64 {
        self.config.noise_sampler.draw(b, &self.unit, rng)
    }
}
