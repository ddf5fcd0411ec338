//! Beam sensor model for the particle filter update step.
//!
//! Each range reading is scored against the range ray-cast from the
//! particle pose with the four-part mixture from Probabilistic Robotics:
//!
//! ```text
//! p(o | e) = z_hit   · eta · N(o; e, σ)                      measurement noise
//!          + z_unexp · λ e^(-λ o) / (1 - e^(-λ max))          unexpected object
//!          + z_max   · 1/band   if o ≥ max - band             sensor failure
//!          + z_rand  · 1/max                                  random reading
//! ```
//!
//! The hit normaliser `eta` is fixed at 1 unless
//! [`SensorModelConfig::exact_hit_normalizer`] is set. The mixture weights
//! are calibrated against the fixed normaliser, so it stays the default.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::RangeMap;
use crate::core::types::Pose;
use crate::error::ConfigError;

/// Largest number of buckets per table axis (a 16-bit range at the default
/// 10-unit bucket).
pub const MAX_TABLE_BUCKETS: usize = u16::MAX as usize / 10 + 1;

/// Largest `max_range` the exact hit normaliser accepts.
pub const MAX_NORMALIZER_RANGE: f64 = u16::MAX as f64;

/// Configuration for the beam sensor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModelConfig {
    /// Standard deviation of the hit Gaussian (native units).
    /// Default: 300
    pub measurement_noise_std_dev: f64,

    /// Rate of the exponential unexpected-object term (1 / native units).
    /// Default: 0.001
    pub unexpected_object_rate: f64,

    /// Width of the max-range failure band (native units).
    /// Default: 100
    pub min_failure_band: f64,

    /// Mixture weight of the hit term.
    /// Default: 50
    pub hit_weight: f64,

    /// Mixture weight of the unexpected-object term.
    /// Default: 30
    pub unexpected_weight: f64,

    /// Mixture weight of the failure term.
    /// Default: 5
    pub failure_weight: f64,

    /// Mixture weight of the random term.
    /// Default: 200
    pub random_weight: f64,

    /// Maximum sensor range (native units).
    /// Default: 5000
    pub max_range: f64,

    /// Tabulate `p(o | e)` at construction.
    pub precompute: bool,

    /// Table bucket width (native units).
    /// Default: 10
    pub table_bucket: f64,

    /// Renormalise the hit Gaussian over [0, max_range].
    pub exact_hit_normalizer: bool,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self {
            measurement_noise_std_dev: 300.0,
            unexpected_object_rate: 0.001,
            min_failure_band: 100.0,
            hit_weight: 50.0,
            unexpected_weight: 30.0,
            failure_weight: 5.0,
            random_weight: 200.0,
            max_range: 5000.0,
            precompute: true,
            table_bucket: 10.0,
            exact_hit_normalizer: false,
        }
    }
}

impl SensorModelConfig {
    /// Evaluate the mixture directly on every call (no table).
    pub fn exact() -> Self {
        Self {
            precompute: false,
            ..Default::default()
        }
    }

    /// Check value ranges and the size of any precomputed storage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("measurement_noise_std_dev", self.measurement_noise_std_dev),
            ("unexpected_object_rate", self.unexpected_object_rate),
            ("min_failure_band", self.min_failure_band),
            ("max_range", self.max_range),
            ("table_bucket", self.table_bucket),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "sensor_model.{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let weights = [
            ("hit_weight", self.hit_weight),
            ("unexpected_weight", self.unexpected_weight),
            ("failure_weight", self.failure_weight),
            ("random_weight", self.random_weight),
        ];
        for (name, weight) in weights {
            if !(weight >= 0.0 && weight.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "sensor_model.{} must be non-negative, got {}",
                    name, weight
                )));
            }
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(ConfigError::Invalid(
                "sensor_model mixture weights are all zero".to_string(),
            ));
        }

        if self.precompute {
            self.table_size()?;
        }
        if self.exact_hit_normalizer && self.max_range > MAX_NORMALIZER_RANGE {
            return Err(ConfigError::Invalid(format!(
                "sensor_model.max_range {} exceeds {} for the exact hit normalizer",
                self.max_range, MAX_NORMALIZER_RANGE
            )));
        }
        Ok(())
    }

    /// Buckets per table axis, bounded by [`MAX_TABLE_BUCKETS`].
    fn table_size(&self) -> Result<usize, ConfigError> {
        let too_large = || {
            ConfigError::Invalid(format!(
                "sensor_model table for max_range {} at bucket {} exceeds {} buckets per axis",
                self.max_range, self.table_bucket, MAX_TABLE_BUCKETS
            ))
        };
        let buckets = self.max_range / self.table_bucket;
        if !(buckets.is_finite() && buckets < MAX_TABLE_BUCKETS as f64) {
            return Err(too_large());
        }
        let size = buckets as usize + 1;
        size.checked_mul(size).ok_or_else(too_large)?;
        Ok(size)
    }
}

/// Trait for sensor models used by the particle filter.
pub trait SensorModel {
    /// Likelihood of a scan given a pose and map: p(o | s, m).
    ///
    /// Unnormalized; may exceed 1.
    fn probability<M: RangeMap + ?Sized>(&self, observations: &[f64], state: &Pose, map: &M)
    -> f64;

    /// Number of beams the model expects per scan.
    fn num_beams(&self) -> usize;
}

/// Square `p(o | e)` table indexed by (observed bucket, expected bucket).
#[derive(Debug, Clone)]
struct LikelihoodTable {
    bucket: f64,
    size: usize,
    values: Vec<f64>,
}

impl LikelihoodTable {
    fn build(model: &BeamSensorModel) -> Result<Self, ConfigError> {
        let bucket = model.config.table_bucket;
        let size = model.config.table_size()?;
        let mut values = Vec::with_capacity(size * size);
        for o in 0..size {
            for e in 0..size {
                values.push(model.beam_likelihood(o as f64 * bucket, e as f64 * bucket));
            }
        }
        Ok(Self {
            bucket,
            size,
            values,
        })
    }

    #[inline]
    fn bucket_of(&self, range: f64) -> usize {
        ((range / self.bucket) as usize).min(self.size - 1)
    }

    #[inline]
    fn lookup(&self, observation: f64, expected: f64) -> f64 {
        let o = self.bucket_of(observation);
        let e = self.bucket_of(expected);
        self.values[o * self.size + e]
    }
}

/// Exact hit normaliser: `1 / Σ_{x=0..max} N(x; e, σ)` over integer x.
///
/// Stores prefix sums of `N(d; 0, σ)` for offsets `d ∈ [-max, max]`, so the
/// sum for any integer `e` is one subtraction.
#[derive(Debug, Clone)]
struct HitNormalizer {
    max: i64,
    /// `prefix[k] = Σ_{d=-max}^{k-max-1} N(d)`
    prefix: Vec<f64>,
}

impl HitNormalizer {
    fn new(max_range: f64, sigma: f64) -> Self {
        let max = max_range.floor().max(0.0) as i64;
        let norm = 1.0 / ((2.0 * PI).sqrt() * sigma);
        let mut prefix = Vec::with_capacity((2 * max + 2) as usize);
        let mut acc = 0.0;
        prefix.push(acc);
        for d in -max..=max {
            let d = d as f64;
            acc += norm * (-(d * d) / (2.0 * sigma * sigma)).exp();
            prefix.push(acc);
        }
        Self { max, prefix }
    }

    /// Sum of `N(x; e, σ)` for integer x in [0, max].
    fn mass(&self, expected: f64) -> f64 {
        let e = (expected.round() as i64).clamp(0, self.max);
        // Offsets x - e run from -e to max - e
        let lo = (-e + self.max) as usize;
        let hi = (self.max - e + self.max) as usize + 1;
        self.prefix[hi] - self.prefix[lo]
    }

    fn eta(&self, expected: f64) -> f64 {
        let mass = self.mass(expected);
        if mass > 0.0 { 1.0 / mass } else { 1.0 }
    }
}

/// Beam-based sensor model over a fixed set of beam mounting poses.
#[derive(Debug, Clone)]
pub struct BeamSensorModel {
    config: SensorModelConfig,
    /// Beam mounting poses in the robot frame.
    beams: Vec<Pose>,
    /// Normaliser of the unexpected-object term.
    unexpected_eta: f64,
    normalizer: Option<HitNormalizer>,
    table: Option<LikelihoodTable>,
}

impl BeamSensorModel {
    /// Create a model for the given beams, building the table if requested.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when [`SensorModelConfig::validate`] fails.
    pub fn new(config: SensorModelConfig, beams: Vec<Pose>) -> Result<Self, ConfigError> {
        config.validate()?;
        let unexpected_eta =
            1.0 / (1.0 - (-config.unexpected_object_rate * config.max_range).exp());
        let normalizer = config
            .exact_hit_normalizer
            .then(|| HitNormalizer::new(config.max_range, config.measurement_noise_std_dev));

        let mut model = Self {
            config,
            beams,
            unexpected_eta,
            normalizer,
            table: None,
        };
        if config.precompute {
            let table = LikelihoodTable::build(&model)?;
            log::debug!(
                "Sensor model table: {}x{} entries, bucket {}",
                table.size,
                table.size,
                table.bucket
            );
            model.table = Some(table);
        }
        Ok(model)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SensorModelConfig {
        &self.config
    }

    /// Beam mounting poses.
    pub fn beams(&self) -> &[Pose] {
        &self.beams
    }

    /// True when lookups go through the precomputed table.
    pub fn is_tabulated(&self) -> bool {
        self.table.is_some()
    }

    /// Hit term: Gaussian around the expected range.
    pub fn measurement_noise(&self, observation: f64, expected: f64) -> f64 {
        let sigma = self.config.measurement_noise_std_dev;
        let eta = self
            .normalizer
            .as_ref()
            .map_or(1.0, |n| n.eta(expected));
        let diff = observation - expected;
        eta * (-(diff * diff) / (2.0 * sigma * sigma)).exp() / ((2.0 * PI).sqrt() * sigma)
    }

    /// Unexpected-object term: truncated exponential over [0, max_range].
    pub fn unexpected_object(&self, observation: f64) -> f64 {
        let rate = self.config.unexpected_object_rate;
        self.unexpected_eta * rate * (-rate * observation).exp()
    }

    /// Failure term: uniform spike over the top of the range.
    pub fn sensor_failure(&self, observation: f64) -> f64 {
        let band = self.config.min_failure_band;
        if observation >= self.config.max_range - band {
            1.0 / band
        } else {
            0.0
        }
    }

    /// Random term: uniform over the whole range.
    pub fn random_measurement(&self) -> f64 {
        1.0 / self.config.max_range
    }

    /// Mixture likelihood of one reading, evaluated directly.
    pub fn beam_likelihood(&self, observation: f64, expected: f64) -> f64 {
        let c = &self.config;
        c.hit_weight * self.measurement_noise(observation, expected)
            + c.unexpected_weight * self.unexpected_object(observation)
            + c.failure_weight * self.sensor_failure(observation)
            + c.random_weight * self.random_measurement()
    }

    /// Mixture likelihood of one reading, via the table when present.
    ///
    /// Table lookups clamp the observation to [0, max_range].
    #[inline]
    pub fn lookup(&self, observation: f64, expected: f64) -> f64 {
        match &self.table {
            Some(table) => {
                let o = observation.clamp(0.0, self.config.max_range);
                table.lookup(o, expected)
            }
            None => self.beam_likelihood(observation, expected),
        }
    }
}

impl SensorModel for BeamSensorModel {
    fn probability<M: RangeMap + ?Sized>(
        &self,
        observations: &[f64],
        state: &Pose,
        map: &M,
    ) -> f64 {
        let mut p = 1.0;
        for (observation, mount) in observations.iter().zip(self.beams.iter()) {
            let from = state.compose(mount);
            let expected = map.estimate_range(&from);
            p *= self.lookup(*observation, expected);
        }
        p
    }

    fn num_beams(&self) -> usize {
        self.beams.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Map where every ray travels the same distance.
    struct ConstantRange(f64);

    impl RangeMap for ConstantRange {
        fn estimate_range(&self, _from: &Pose) -> f64 {
            self.0
        }
        fn contains(&self, _pose: &Pose) -> bool {
            true
        }
        fn extent(&self) -> (f64, f64) {
            (10_000.0, 10_000.0)
        }
    }

    /// Map whose range depends only on the ray heading: 400 towards +x,
    /// 2000 elsewhere.
    struct WallToTheEast;

    impl RangeMap for WallToTheEast {
        fn estimate_range(&self, from: &Pose) -> f64 {
            let h = crate::core::math::normalize_degrees(from.heading);
            if !(45.0..=315.0).contains(&h) { 400.0 } else { 2000.0 }
        }
        fn contains(&self, _pose: &Pose) -> bool {
            true
        }
        fn extent(&self) -> (f64, f64) {
            (10_000.0, 10_000.0)
        }
    }

    fn single_beam(config: SensorModelConfig) -> BeamSensorModel {
        BeamSensorModel::new(config, vec![Pose::default()]).unwrap()
    }

    #[test]
    fn test_hit_term_peaks_at_expected() {
        let model = single_beam(SensorModelConfig::exact());
        let at = model.measurement_noise(1000.0, 1000.0);
        assert_relative_eq!(at, 1.0 / ((2.0 * PI).sqrt() * 300.0), epsilon = 1e-12);
        assert!(model.measurement_noise(1300.0, 1000.0) < at);
        assert_relative_eq!(
            model.measurement_noise(700.0, 1000.0),
            model.measurement_noise(1300.0, 1000.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_unexpected_term_integrates_to_one() {
        let model = single_beam(SensorModelConfig::exact());
        let step = 1.0;
        let total: f64 = (0..5000)
            .map(|o| model.unexpected_object(o as f64 + 0.5) * step)
            .sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_failure_band() {
        let model = single_beam(SensorModelConfig::exact());
        assert_eq!(model.sensor_failure(4899.0), 0.0);
        assert_relative_eq!(model.sensor_failure(4900.0), 0.01);
        assert_relative_eq!(model.sensor_failure(5000.0), 0.01);
    }

    #[test]
    fn test_mixture_sum() {
        let model = single_beam(SensorModelConfig::exact());
        let expected = 50.0 * model.measurement_noise(2000.0, 1500.0)
            + 30.0 * model.unexpected_object(2000.0)
            + 200.0 / 5000.0;
        assert_relative_eq!(model.beam_likelihood(2000.0, 1500.0), expected);
    }

    #[test]
    fn test_table_matches_direct_on_bucket_edges() {
        let tabulated = single_beam(SensorModelConfig::default());
        let direct = single_beam(SensorModelConfig::exact());
        assert!(tabulated.is_tabulated());
        assert!(!direct.is_tabulated());
        for (o, e) in [(0.0, 0.0), (400.0, 400.0), (1230.0, 3370.0), (5000.0, 5000.0)] {
            assert_relative_eq!(
                tabulated.lookup(o, e),
                direct.beam_likelihood(o, e),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_table_floors_into_buckets() {
        let model = single_beam(SensorModelConfig::default());
        assert_relative_eq!(model.lookup(409.9, 400.0), model.beam_likelihood(400.0, 400.0));
    }

    #[test]
    fn test_table_clamps_observations() {
        let model = single_beam(SensorModelConfig::default());
        assert_relative_eq!(model.lookup(65_535.0, 1000.0), model.lookup(5000.0, 1000.0));
        assert_relative_eq!(model.lookup(-20.0, 1000.0), model.lookup(0.0, 1000.0));
    }

    #[test]
    fn test_exact_normalizer() {
        let config = SensorModelConfig {
            exact_hit_normalizer: true,
            precompute: false,
            ..Default::default()
        };
        let model = single_beam(config);
        let normalizer = model.normalizer.as_ref().unwrap();

        // Mid-range: almost all Gaussian mass is inside [0, max]
        assert_relative_eq!(normalizer.eta(2500.0), 1.0, epsilon = 1e-6);
        // At the origin half the mass is cut off
        assert_relative_eq!(normalizer.eta(0.0), 2.0, epsilon = 0.01);

        let brute: f64 = (0..=5000)
            .map(|x| {
                let d = x as f64 - 100.0;
                (-(d * d) / (2.0 * 300.0 * 300.0)).exp() / ((2.0 * PI).sqrt() * 300.0)
            })
            .sum();
        assert_relative_eq!(normalizer.mass(100.0), brute, epsilon = 1e-9);
        let fixed = single_beam(SensorModelConfig::exact());
        assert!(model.measurement_noise(100.0, 100.0) > fixed.measurement_noise(100.0, 100.0));
    }

    #[test]
    fn test_probability_is_product_over_beams() {
        let beams = vec![Pose::default(); 3];
        let model = BeamSensorModel::new(SensorModelConfig::exact(), beams).unwrap();
        let map = ConstantRange(1000.0);
        let p = model.probability(&[1000.0, 1200.0, 4950.0], &Pose::default(), &map);
        let expected = model.beam_likelihood(1000.0, 1000.0)
            * model.beam_likelihood(1200.0, 1000.0)
            * model.beam_likelihood(4950.0, 1000.0);
        assert_relative_eq!(p, expected, max_relative = 1e-12);
        assert_eq!(model.num_beams(), 3);
    }

    #[test]
    fn test_correct_heading_is_more_likely() {
        // Two beams: forward and backward
        let beams = vec![Pose::new(0.0, 0.0, 0.0), Pose::new(0.0, 0.0, 180.0)];
        let model = BeamSensorModel::new(SensorModelConfig::default(), beams).unwrap();
        let scan = [400.0, 2000.0];

        let facing_wall = model.probability(&scan, &Pose::new(0.0, 0.0, 0.0), &WallToTheEast);
        let facing_away = model.probability(&scan, &Pose::new(0.0, 0.0, 180.0), &WallToTheEast);
        assert!(
            facing_wall > 3.0 * facing_away,
            "{} vs {}",
            facing_wall,
            facing_away
        );
    }

    #[test]
    fn test_empty_scan_is_neutral() {
        let model = BeamSensorModel::new(SensorModelConfig::exact(), Vec::new()).unwrap();
        assert_eq!(model.probability(&[], &Pose::default(), &ConstantRange(10.0)), 1.0);
    }

    #[test]
    fn test_oversized_table_rejected() {
        for max_range in [1e12, 1e6, 65_540.0] {
            let config = SensorModelConfig {
                max_range,
                ..Default::default()
            };
            let err = BeamSensorModel::new(config, vec![Pose::default()]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{max_range}");
        }

        // Largest range the default bucket allows
        let config = SensorModelConfig {
            max_range: 65_535.0,
            precompute: false,
            ..Default::default()
        };
        assert_eq!(config.table_size().unwrap(), MAX_TABLE_BUCKETS);
        // Direct evaluation has no table to bound
        let config = SensorModelConfig {
            max_range: 1e12,
            precompute: false,
            ..Default::default()
        };
        assert!(BeamSensorModel::new(config, Vec::new()).is_ok());
    }

    #[test]
    fn test_oversized_normalizer_rejected() {
        let config = SensorModelConfig {
            max_range: 1e9,
            precompute: false,
            exact_hit_normalizer: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_weights_rejected() {
        let negative = [
            SensorModelConfig {
                hit_weight: -1.0,
                ..SensorModelConfig::exact()
            },
            SensorModelConfig {
                unexpected_weight: -0.5,
                ..SensorModelConfig::exact()
            },
            SensorModelConfig {
                failure_weight: -5.0,
                ..SensorModelConfig::exact()
            },
            SensorModelConfig {
                random_weight: f64::NAN,
                ..SensorModelConfig::exact()
            },
        ];
        for config in negative {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }

        let all_zero = SensorModelConfig {
            hit_weight: 0.0,
            unexpected_weight: 0.0,
            failure_weight: 0.0,
            random_weight: 0.0,
            ..SensorModelConfig::exact()
        };
        assert!(all_zero.validate().is_err());

        // A single zero weight is fine
        let no_failure = SensorModelConfig {
            failure_weight: 0.0,
            ..SensorModelConfig::exact()
        };
        assert!(no_failure.validate().is_ok());
    }
}
