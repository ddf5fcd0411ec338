//! Particle clustering into pose hypotheses.
//!
//! A fixed mixture of [`MAX_HYPOTHESES`] Gaussians over (x, y, heading) is
//! fitted to the particle cloud with Expectation-Maximization. Parameters
//! carry over between calls, so a few iterations per tick track a slowly
//! moving cloud.
//!
//! Heading is treated as a linear coordinate in degrees. A cluster that
//! straddles 0°/360° is reported with a mean near 180° and a wide heading
//! variance.
//!
//! [`MAX_HYPOTHESES`]: crate::core::types::MAX_HYPOTHESES

mod em;

pub use em::{ClusteringConfig, HypothesisClusterer, MixtureComponent, gaussian_density};
