//! EM Gaussian mixture over particle poses.

use std::f64::consts::PI;

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::algorithms::localization::Particle;
use crate::core::random::seeded_rng;
use crate::core::types::{Covariance3, Hypothesis, HypothesisSet, MAX_HYPOTHESES, Pose};

/// Configuration for hypothesis clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// EM iterations per call.
    /// Default: 10
    pub iterations: usize,

    /// Upper bound of the random x/y variance given to (re)initialized
    /// components (native units²).
    /// Default: 10000
    pub max_position_variance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            max_position_variance: 10_000.0,
        }
    }
}

/// One Gaussian of the mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureComponent {
    /// Mixing weight.
    pub weight: f64,
    /// Mean (x, y, heading).
    pub mean: [f64; 3],
    pub covariance: Covariance3,
}

/// `1 / (2π)^(3/2)`
fn normalizer() -> f64 {
    1.0 / (2.0 * PI).powf(1.5)
}

/// Trivariate normal density of `x` given a precomputed inverse covariance
/// and determinant.
#[inline]
fn density_with(x: &[f64; 3], mean: &[f64; 3], inverse: &Covariance3, det: f64) -> f64 {
    let d = [x[0] - mean[0], x[1] - mean[1], x[2] - mean[2]];
    let quad = inverse.quadratic_form(&d);
    let tail = (-0.5 * quad).exp();
    if !tail.is_finite() {
        return 0.0;
    }
    normalizer() / det.abs().sqrt() * tail
}

/// Trivariate normal density at `x`.
///
/// Singular covariances are regularized (see [`Covariance3::regularized`]).
pub fn gaussian_density(x: &[f64; 3], mean: &[f64; 3], covariance: &Covariance3) -> f64 {
    let (inverse, det) = covariance.inverse_with_determinant();
    density_with(x, mean, &inverse, det)
}

/// EM clusterer with warm-started mixture parameters.
#[derive(Debug, Clone)]
pub struct HypothesisClusterer {
    config: ClusteringConfig,
    components: Vec<MixtureComponent>,
    /// Map extent (width, height) used to place random components.
    extent: (f64, f64),
    rng: SmallRng,
    unit: Uniform<f64>,
    /// Responsibilities, one row of `MAX_HYPOTHESES` per particle.
    responsibilities: Vec<[f64; MAX_HYPOTHESES]>,
}

impl HypothesisClusterer {
    /// Create a clusterer with random components spread over `extent`.
    pub fn new(config: ClusteringConfig, extent: (f64, f64), seed: u64) -> Self {
        let mut clusterer = Self {
            config,
            components: Vec::with_capacity(MAX_HYPOTHESES),
            extent,
            rng: seeded_rng(seed),
            unit: Uniform::new(0.0, 1.0),
            responsibilities: Vec::new(),
        };
        clusterer.reset(extent);
        clusterer
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Current mixture parameters.
    pub fn components(&self) -> &[MixtureComponent] {
        &self.components
    }

    /// Re-randomize every component with weight `1 / MAX_HYPOTHESES`.
    pub fn reset(&mut self, extent: (f64, f64)) {
        self.extent = extent;
        self.components.clear();
        for _ in 0..MAX_HYPOTHESES {
            let mut component = self.random_component();
            component.weight = 1.0 / MAX_HYPOTHESES as f64;
            self.components.push(component);
        }
    }

    /// Zero-weight component with a random mean and diagonal covariance.
    fn random_component(&mut self) -> MixtureComponent {
        let (width, height) = self.extent;
        let mut draw = |scale: f64| self.unit.sample(&mut self.rng) * scale;
        let mean = [draw(width), draw(height), draw(360.0)];
        let covariance = Covariance3::diagonal(
            draw(self.config.max_position_variance),
            draw(self.config.max_position_variance),
            draw(360.0),
        );
        MixtureComponent {
            weight: 0.0,
            mean,
            covariance,
        }
    }

    /// Fit the mixture to the particles and report non-empty components.
    pub fn cluster(&mut self, particles: &[Particle]) -> HypothesisSet {
        let points: Vec<[f64; 3]> = particles.iter().map(|p| p.pose.to_array()).collect();
        if !points.is_empty() {
            for _ in 0..self.config.iterations {
                self.expectation(&points);
                self.maximization(&points);
            }
        }
        self.hypotheses()
    }

    /// Components with non-zero weight as hypotheses.
    pub fn hypotheses(&self) -> HypothesisSet {
        let mut set = HypothesisSet::new();
        for component in self.components.iter().filter(|c| c.weight > 0.0) {
            set.push(Hypothesis {
                weight: component.weight,
                mean: Pose::from_array(component.mean),
                covariance: component.covariance,
            });
        }
        set
    }

    /// E-step: responsibility of each component for each particle.
    fn expectation(&mut self, points: &[[f64; 3]]) {
        let params: Vec<(Covariance3, f64)> = self
            .components
            .iter()
            .map(|c| c.covariance.inverse_with_determinant())
            .collect();

        self.responsibilities.clear();
        self.responsibilities
            .resize(points.len(), [0.0; MAX_HYPOTHESES]);

        for (x, row) in points.iter().zip(self.responsibilities.iter_mut()) {
            let mut sum = 0.0;
            for (m, (component, (inverse, det))) in
                self.components.iter().zip(params.iter()).enumerate()
            {
                row[m] = density_with(x, &component.mean, inverse, *det) * component.weight;
                sum += row[m];
            }

            if sum > 0.0 && sum.is_finite() {
                row.iter_mut().for_each(|z| *z /= sum);
            } else {
                row.fill(1.0 / MAX_HYPOTHESES as f64);
            }
        }
    }

    /// M-step: re-estimate weights, means and covariances.
    fn maximization(&mut self, points: &[[f64; 3]]) {
        let n = points.len() as f64;

        for m in 0..self.components.len() {
            let mut mass = 0.0;
            let mut weighted = [0.0; 3];
            for (x, row) in points.iter().zip(self.responsibilities.iter()) {
                let z = row[m];
                mass += z;
                weighted[0] += z * x[0];
                weighted[1] += z * x[1];
                weighted[2] += z * x[2];
            }

            // A subnormal mass cannot give a stable mean; treat it as empty
            if mass >= f64::MIN_POSITIVE {
                let mean = [weighted[0] / mass, weighted[1] / mass, weighted[2] / mass];
                let mut s = [0.0; 6];
                for (x, row) in points.iter().zip(self.responsibilities.iter()) {
                    let z = row[m];
                    let d = [x[0] - mean[0], x[1] - mean[1], x[2] - mean[2]];
                    s[0] += z * d[0] * d[0];
                    s[1] += z * d[0] * d[1];
                    s[2] += z * d[0] * d[2];
                    s[3] += z * d[1] * d[1];
                    s[4] += z * d[1] * d[2];
                    s[5] += z * d[2] * d[2];
                }
                self.components[m] = MixtureComponent {
                    weight: mass / n,
                    mean,
                    covariance: Covariance3::symmetric(
                        s[0] / mass,
                        s[1] / mass,
                        s[2] / mass,
                        s[3] / mass,
                        s[4] / mass,
                        s[5] / mass,
                    ),
                };
            } else {
                self.components[m] = self.random_component();
                log::trace!("Re-randomized empty mixture component {}", m);
            }
        }
    }
}
