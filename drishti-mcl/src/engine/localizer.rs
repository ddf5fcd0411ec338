//! Localization engine: one filter, one map, one range sensor.

use std::path::Path;

use crate::algorithms::clustering::HypothesisClusterer;
use crate::algorithms::localization::{BeamSensorModel, MotionModel, ParticleFilter};
use crate::algorithms::mapping::GridMap;
use crate::config::EngineConfig;
use crate::core::random::derive_seed;
use crate::core::types::{HypothesisSet, Pose};
use crate::error::{ConfigError, EngineError, Result};
use crate::sensors::{BeamSelection, RangeSensor};

use super::UpdateThrottle;

/// Seed stream of the hypothesis clusterer, relative to the filter seed.
const CLUSTER_SEED_STREAM: u64 = 1;

/// Monte Carlo Localization over a known occupancy map.
///
/// Each [`tick`](Self::tick) consumes one range scan and one odometry pose
/// and returns the current pose hypotheses.
#[derive(Debug, Clone)]
pub struct LocalizationEngine {
    config: EngineConfig,
    map: GridMap,
    sensor: RangeSensor,
    beams: BeamSelection,
    sensor_model: BeamSensorModel,
    motion_model: MotionModel,
    filter: ParticleFilter,
    clusterer: HypothesisClusterer,
    throttle: UpdateThrottle,
    /// Odometry of the last processed tick.
    last_odometry: Option<Pose>,
    hypotheses: HypothesisSet,
    /// Set when a tick collapsed the filter; cleared by `reset`.
    collapsed: bool,
}

impl LocalizationEngine {
    /// Validate the configuration, load the map and reset the filter.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let map = GridMap::load(
            &config.map.file,
            config.map.pixels_per_unit,
            config.map.occupancy_threshold,
            config.sensor.max_range,
        )?;
        Self::with_map(config, map)
    }

    /// Build an engine around an already loaded map.
    ///
    /// The map's ray-cast cap is set to `[sensor] max_range`.
    pub fn with_map(config: EngineConfig, map: GridMap) -> Result<Self> {
        config.validate()?;
        let map = fit_range(map, config.sensor.max_range);

        let sensor = config.range_sensor();
        let beams = BeamSelection::new(&sensor, config.sensor.num_samples);
        let sensor_model =
            BeamSensorModel::new(config.sensor_model_config(), beams.poses().to_vec())?;
        let motion_model = MotionModel::new(config.motion_model);
        let filter = ParticleFilter::new(config.particle_filter_config(), &map);
        let clusterer = HypothesisClusterer::new(
            config.clustering,
            map.extent(),
            derive_seed(config.filter.seed, CLUSTER_SEED_STREAM),
        );
        let hypotheses = clusterer.hypotheses();

        log::info!(
            "Localization engine: {} particles, {} {} beams ({} used), map {}x{}",
            filter.num_particles(),
            sensor.num_ranges(),
            sensor.kind(),
            beams.len(),
            map.width(),
            map.height()
        );

        Ok(Self {
            throttle: UpdateThrottle::new(config.filter.update_frequency),
            config,
            map,
            sensor,
            beams,
            sensor_model,
            motion_model,
            filter,
            clusterer,
            last_odometry: None,
            hypotheses,
            collapsed: false,
        })
    }

    /// Process one scan and odometry reading.
    ///
    /// The first tick only records odometry. A tick whose odometry is
    /// bit-identical to the previous one leaves the particles untouched.
    /// Both cases still re-cluster the current population.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ScanLength`] if `ranges` is shorter than the sensor
    /// - [`EngineError::Filter`] when this update collapses the filter
    /// - [`EngineError::ResetRequired`] on every tick after a collapse until
    ///   [`reset`](Self::reset) is called
    pub fn tick(&mut self, ranges: &[f64], odometry: &Pose) -> Result<HypothesisSet> {
        if self.collapsed {
            return Err(EngineError::ResetRequired);
        }

        let observations = self
            .beams
            .select(ranges)
            .ok_or(EngineError::ScanLength {
                expected: self.beams.scan_len(),
                actual: ranges.len(),
            })?;

        let previous = self.last_odometry.replace(*odometry);
        match previous {
            Some(from) if !from.bit_eq(odometry) => {
                if let Err(e) = self.filter.update(
                    &self.motion_model,
                    &self.sensor_model,
                    &from,
                    odometry,
                    &observations,
                    &self.map,
                ) {
                    self.collapsed = true;
                    return Err(e.into());
                }
                let state = self.filter.state();
                log::debug!(
                    "Generation {}: neff {:.1}, max weight {:.4}, {} in bounds",
                    state.generations,
                    state.neff,
                    state.max_weight,
                    state.in_bounds
                );
            }
            Some(_) => log::trace!("Odometry unchanged; skipping filter update"),
            None => log::debug!("First odometry reading recorded"),
        }

        self.hypotheses = self.clusterer.cluster(self.filter.particles());
        Ok(self.hypotheses.clone())
    }

    /// Whether a tick is due at `sim_time` under `update_frequency`.
    pub fn is_due(&mut self, sim_time: f64) -> bool {
        self.throttle.is_due(sim_time)
    }

    /// Scatter the particles over the map again and re-randomize the
    /// clustering. The last odometry reading becomes the new reference.
    pub fn reset(&mut self) {
        self.filter.reset(&self.map);
        self.restart_tracking();
    }

    /// Clustering and collapse state for a freshly scattered population.
    fn restart_tracking(&mut self) {
        self.clusterer.reset(self.map.extent());
        self.hypotheses = self.clusterer.hypotheses();
        self.collapsed = false;
        log::info!(
            "Localization reset: {} particles over {}x{} cells",
            self.filter.num_particles(),
            self.map.width(),
            self.map.height()
        );
    }

    /// Change the population size. Forces a reset.
    pub fn set_num_particles(&mut self, num_particles: usize) -> Result<()> {
        if num_particles == 0 {
            let reason = "particle count must be at least 1".to_string();
            return Err(ConfigError::Invalid(reason).into());
        }
        self.config.filter.num_particles = num_particles;
        self.filter.set_num_particles(num_particles, &self.map);
        self.restart_tracking();
        Ok(())
    }

    /// Load a new map file and reset onto it.
    ///
    /// On failure the current map stays in place and the filter is untouched.
    pub fn load_map(&mut self, path: &Path) -> Result<()> {
        let map = GridMap::load(
            path,
            self.config.map.pixels_per_unit,
            self.config.map.occupancy_threshold,
            self.config.sensor.max_range,
        )?;
        self.config.map.file = path.to_path_buf();
        self.replace_map(map);
        Ok(())
    }

    /// Swap in an in-memory map and reset onto it.
    pub fn replace_map(&mut self, map: GridMap) {
        self.map = fit_range(map, self.config.sensor.max_range);
        self.reset();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn sensor(&self) -> &RangeSensor {
        &self.sensor
    }

    /// Beams used for weighting.
    pub fn beams(&self) -> &BeamSelection {
        &self.beams
    }

    pub fn filter(&self) -> &ParticleFilter {
        &self.filter
    }

    /// Hypotheses from the most recent tick (or reset).
    pub fn hypotheses(&self) -> &HypothesisSet {
        &self.hypotheses
    }

    pub fn last_odometry(&self) -> Option<Pose> {
        self.last_odometry
    }

    /// Whether the filter collapsed and awaits a reset.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}

/// Cap ray casts at the range the sensor model scores against.
fn fit_range(map: GridMap, max_range: f64) -> GridMap {
    if map.max_range() != max_range {
        log::debug!(
            "Map ray-cast range {} replaced by sensor range {}",
            map.max_range(),
            max_range
        );
    }
    map.with_max_range(max_range)
}
