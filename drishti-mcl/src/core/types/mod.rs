//! Core value types.
//!
//! - [`Pose`]: (x, y, heading) in native map units and degrees
//! - [`Covariance3`]: 3x3 covariance over a pose
//! - [`Hypothesis`] / [`HypothesisSet`]: clustered pose estimates

mod covariance;
mod hypothesis;
mod pose;

pub use covariance::{Covariance3, SINGULAR_EPSILON};
pub use hypothesis::{Hypothesis, HypothesisSet, MAX_HYPOTHESES};
pub use pose::Pose;
