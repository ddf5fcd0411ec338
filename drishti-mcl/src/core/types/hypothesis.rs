//! Pose hypotheses emitted by clustering.

use serde::{Deserialize, Serialize};

use super::{Covariance3, Pose};

/// Maximum number of hypotheses reported per tick.
///
/// Matches the fixed hypothesis capacity of the Player localization interface.
pub const MAX_HYPOTHESES: usize = 10;

/// One Gaussian summary of a particle cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Mixing weight in (0, 1].
    pub weight: f64,
    /// Mean pose.
    pub mean: Pose,
    /// Covariance over (x, y, heading).
    pub covariance: Covariance3,
}

/// Sparse, capacity-bounded list of hypotheses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypothesisSet {
    hypotheses: Vec<Hypothesis>,
}

impl HypothesisSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            hypotheses: Vec::with_capacity(MAX_HYPOTHESES),
        }
    }

    /// Add a hypothesis. Returns `false` (and drops it) once the set is full.
    pub fn push(&mut self, hypothesis: Hypothesis) -> bool {
        if self.hypotheses.len() >= MAX_HYPOTHESES {
            return false;
        }
        self.hypotheses.push(hypothesis);
        true
    }

    /// Number of hypotheses.
    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    /// True when no hypotheses are present.
    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    /// Hypotheses as slice.
    pub fn as_slice(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    /// Iterate over hypotheses.
    pub fn iter(&self) -> std::slice::Iter<'_, Hypothesis> {
        self.hypotheses.iter()
    }

    /// Sum of mixing weights.
    pub fn total_weight(&self) -> f64 {
        self.hypotheses.iter().map(|h| h.weight).sum()
    }

    /// Hypothesis with the largest weight.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.hypotheses
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }
}

impl<'a> IntoIterator for &'a HypothesisSet {
    type Item = &'a Hypothesis;
    type IntoIter = std::slice::Iter<'a, Hypothesis>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hypothesis(weight: f64) -> Hypothesis {
        Hypothesis {
            weight,
            mean: Pose::default(),
            covariance: Covariance3::diagonal(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut set = HypothesisSet::new();
        for _ in 0..MAX_HYPOTHESES {
            assert!(set.push(hypothesis(0.1)));
        }
        assert!(!set.push(hypothesis(0.1)));
        assert_eq!(set.len(), MAX_HYPOTHESES);
    }

    #[test]
    fn test_best() {
        let mut set = HypothesisSet::new();
        assert!(set.best().is_none());
        set.push(hypothesis(0.2));
        set.push(hypothesis(0.7));
        set.push(hypothesis(0.1));
        assert_eq!(set.best().map(|h| h.weight), Some(0.7));
        assert!((set.total_weight() - 1.0).abs() < 1e-12);
    }
}
