use serde::{Deserialize, Serialize};
use std::fmt;

/// Criterion deciding when a response counts as hitting a lesion
///
/// Each variant selects a concrete classifier; see
/// [`crate::matching::classifier_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Criteria {
    /// Response point must lie inside the lesion sphere; conflicts are
    /// resolved by deferred acceptance
    #[default]
    WithinLesion,
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::WithinLesion => write!(f, "within-lesion"),
        }
    }
}

/// Configuration for an evaluation run
///
/// # Example
///
/// ```
/// use lesionmatch_core::{Criteria, EvaluationConfig};
///
/// let config = EvaluationConfig::default()
///     .min_lesion_radius(1.5)
///     .parallel(false);
///
/// assert_eq!(config.criteria, Criteria::WithinLesion);
/// assert_eq!(config.min_lesion_radius, 1.5);
/// assert!(!config.parallel);
/// assert!(!config.allow_incomplete);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Classifier variant
    pub criteria: Criteria,

    /// Floor applied by the loader to fitted lesion radii, in millimeters
    pub min_lesion_radius: f64,

    /// Classify cases on the rayon thread pool
    pub parallel: bool,

    /// Keep going when some rater/case pairs contributed no records
    pub allow_incomplete: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            criteria: Criteria::WithinLesion,
            min_lesion_radius: 0.0,
            parallel: true,
            allow_incomplete: false,
        }
    }
}

impl EvaluationConfig {
    /// Builder: Set the classifier criteria
    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Builder: Set the lesion radius floor
    ///
    /// Negative values are clamped to zero.
    pub fn min_lesion_radius(mut self, radius: f64) -> Self {
        self.min_lesion_radius = radius.max(0.0);
        self
    }

    /// Builder: Enable or disable parallel case classification
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder: Proceed with partial data instead of failing
    pub fn allow_incomplete(mut self, allow: bool) -> Self {
        self.allow_incomplete = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvaluationConfig::default();
        assert_eq!(config.criteria, Criteria::WithinLesion);
        assert_eq!(config.min_lesion_radius, 0.0);
        assert!(config.parallel);
        assert!(!config.allow_incomplete);
    }

    #[test]
    fn test_negative_floor_clamped() {
        let config = EvaluationConfig::default().min_lesion_radius(-2.0);
        assert_eq!(config.min_lesion_radius, 0.0);
    }

    #[test]
    fn test_criteria_serde_name() {
        let json = serde_json::to_string(&Criteria::WithinLesion).unwrap();
        assert_eq!(json, "\"within-lesion\"");
        assert_eq!(Criteria::WithinLesion.to_string(), "within-lesion");
    }
}
