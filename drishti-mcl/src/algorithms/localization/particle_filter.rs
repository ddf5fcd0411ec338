//! Sampling-importance-resampling (SIR) particle filter.
//!
//! One generation per update:
//! 1. Resample-with-motion: draw N ancestors from the cumulative weights and
//!    push each through the motion model
//! 2. Reweight: score every particle with the sensor model
//! 3. Normalize and rebuild the cumulative weights
//!
//! The previous generation is discarded wholesale.

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use super::motion_model::MotionModel;
use super::sensor_model::SensorModel;
use crate::algorithms::mapping::RangeMap;
use crate::core::random::seeded_rng;
use crate::core::types::Pose;
use crate::error::FilterError;

/// A single particle representing a possible robot pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Hypothesized robot pose.
    pub pose: Pose,
    /// Normalized importance weight.
    pub importance: f64,
    /// Running sum of importances up to and including this particle.
    pub cumulative: f64,
}

impl Particle {
    /// Create a particle with zero weight.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            importance: 0.0,
            cumulative: 0.0,
        }
    }
}

/// Configuration for the particle filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFilterConfig {
    /// Number of particles.
    /// Default: 1000
    pub num_particles: usize,

    /// Random seed for deterministic behavior (0 for random).
    pub seed: u64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 1000,
            seed: 0,
        }
    }
}

/// State of the particle filter for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleFilterState {
    /// Effective number of particles after the last reweight.
    pub neff: f64,
    /// Largest normalized importance.
    pub max_weight: f64,
    /// Sum of raw likelihoods before normalization.
    pub total_likelihood: f64,
    /// Particles that landed inside the map.
    pub in_bounds: usize,
    /// Generations since the last reset.
    pub generations: u64,
}

/// Monte Carlo Localization particle filter.
#[derive(Debug, Clone)]
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    particles: Vec<Particle>,
    rng: SmallRng,
    unit: Uniform<f64>,
    state: ParticleFilterState,
}

impl ParticleFilter {
    /// Create a filter and spread its particles uniformly over the map.
    pub fn new<M: RangeMap + ?Sized>(config: ParticleFilterConfig, map: &M) -> Self {
        let mut filter = Self {
            config,
            particles: Vec::new(),
            rng: seeded_rng(config.seed),
            unit: Uniform::new(0.0, 1.0),
            state: ParticleFilterState::default(),
        };
        filter.reset(map);
        filter
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// Get current particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Get current filter state (for diagnostics).
    pub fn state(&self) -> &ParticleFilterState {
        &self.state
    }

    /// Get the number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Change the population size. The population is regenerated.
    pub fn set_num_particles<M: RangeMap + ?Sized>(&mut self, num_particles: usize, map: &M) {
        self.config.num_particles = num_particles;
        self.reset(map);
    }

    /// Regenerate N particles uniformly over the map extent and [0, 360).
    ///
    /// Every particle gets importance `1/N`; the cumulative weights form a
    /// ramp ending at exactly 1.
    pub fn reset<M: RangeMap + ?Sized>(&mut self, map: &M) {
        let n = self.config.num_particles;
        let (width, height) = map.extent();
        let weight = if n > 0 { 1.0 / n as f64 } else { 0.0 };

        self.particles = (0..n)
            .map(|i| {
                let x = self.unit.sample(&mut self.rng) * width;
                let y = self.unit.sample(&mut self.rng) * height;
                let heading = self.unit.sample(&mut self.rng) * 360.0;
                Particle {
                    pose: Pose::new(x, y, heading),
                    importance: weight,
                    cumulative: (i + 1) as f64 * weight,
                }
            })
            .collect();
        if let Some(last) = self.particles.last_mut() {
            last.cumulative = 1.0;
        }

        self.state = ParticleFilterState {
            neff: n as f64,
            max_weight: weight,
            ..Default::default()
        };
        log::debug!(
            "Particle filter reset: {} particles over {:.1}x{:.1}",
            n,
            width,
            height
        );
    }

    /// Index of the particle whose cumulative interval contains `u`.
    #[inline]
    fn select(&self, u: f64) -> usize {
        let idx = self.particles.partition_point(|p| p.cumulative <= u);
        idx.min(self.particles.len().saturating_sub(1))
    }

    /// Resample-with-motion: replace the population with N motion samples
    /// drawn from ancestors chosen in proportion to their importance.
    ///
    /// Importances of the new generation are zero until [`Self::reweight`].
    pub fn resample(&mut self, motion: &MotionModel, from: &Pose, to: &Pose) {
        if self.particles.is_empty() {
            return;
        }
        let n = self.particles.len();
        let mut next = Vec::with_capacity(n);
        for _ in 0..n {
            let u = self.unit.sample(&mut self.rng);
            let ancestor = &self.particles[self.select(u)];
            let pose = motion.sample(&ancestor.pose, from, to, &mut self.rng);
            next.push(Particle::new(pose));
        }
        self.particles = next;
        self.state.generations += 1;
    }

    /// Weight every particle against a scan, then normalize.
    ///
    /// Particles outside the map get zero weight. Returns
    /// [`FilterError::Collapsed`] when no particle has positive finite weight;
    /// the population must then be reset before the next update.
    pub fn reweight<S, M>(
        &mut self,
        sensor: &S,
        observations: &[f64],
        map: &M,
    ) -> Result<(), FilterError>
    where
        S: SensorModel + ?Sized,
        M: RangeMap + ?Sized,
    {
        let mut total = 0.0;
        let mut in_bounds = 0;
        for particle in &mut self.particles {
            particle.importance = if map.contains(&particle.pose) {
                in_bounds += 1;
                sensor.probability(observations, &particle.pose, map)
            } else {
                0.0
            };
            total += particle.importance;
        }
        self.state.total_likelihood = total;
        self.state.in_bounds = in_bounds;

        if !(total > 0.0 && total.is_finite()) {
            log::warn!(
                "Particle filter collapsed: total likelihood {} ({} of {} particles in bounds)",
                total,
                in_bounds,
                self.particles.len()
            );
            return Err(FilterError::Collapsed);
        }

        let mut cumulative = 0.0;
        let mut sum_sq = 0.0;
        let mut max_weight: f64 = 0.0;
        for particle in &mut self.particles {
            particle.importance /= total;
            cumulative += particle.importance;
            particle.cumulative = cumulative;
            sum_sq += particle.importance * particle.importance;
            max_weight = max_weight.max(particle.importance);
        }
        if let Some(last) = self.particles.last_mut() {
            last.cumulative = 1.0;
        }

        self.state.neff = if sum_sq > 0.0 { 1.0 / sum_sq } else { 0.0 };
        self.state.max_weight = max_weight;
        Ok(())
    }

    /// One full SIR generation: resample with motion, then reweight.
    pub fn update<S, M>(
        &mut self,
        motion: &MotionModel,
        sensor: &S,
        from: &Pose,
        to: &Pose,
        observations: &[f64],
        map: &M,
    ) -> Result<(), FilterError>
    where
        S: SensorModel + ?Sized,
        M: RangeMap + ?Sized,
    {
        self.resample(motion, from, to);
        self.reweight(sensor, observations, map)
    }

    /// Importance-weighted mean pose, heading averaged on the circle.
    pub fn estimate(&self) -> Pose {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_sin = 0.0;
        let mut sum_cos = 0.0;
        let mut total_weight = 0.0;

        for p in &self.particles {
            let w = p.importance;
            let h = p.pose.heading_rad();
            sum_x += w * p.pose.x;
            sum_y += w * p.pose.y;
            sum_sin += w * h.sin();
            sum_cos += w * h.cos();
            total_weight += w;
        }

        if total_weight > 0.0 {
            Pose::normalized(
                sum_x / total_weight,
                sum_y / total_weight,
                sum_sin.atan2(sum_cos).to_degrees(),
            )
        } else {
            Pose::default()
        }
    }
}
