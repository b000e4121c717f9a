use serde::Serialize;
use std::cmp::Ordering;

use super::{CaseKey, Coordinates};
use crate::error::{LesionMatchError, Result};

/// A rater's mark: a representative point with a confidence rating
///
/// Classification (true/false positive) is produced by the matcher and
/// is not stored on the response itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    name: String,
    coords: Coordinates,
    confidence: f64,
    radius: Option<f64>,
    case: CaseKey,
}

impl Response {
    /// Creates a new response
    ///
    /// # Errors
    ///
    /// Returns [`LesionMatchError::Validation`] if the confidence is not a
    /// finite number, the radius is negative or non-finite, or the point has
    /// a non-finite component.
    pub fn new(
        name: impl Into<String>,
        case: CaseKey,
        coords: Coordinates,
        confidence: f64,
        radius: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if !confidence.is_finite() {
            return Err(LesionMatchError::Validation(format!(
                "response '{}' in {} has non-finite confidence {}",
                name, case, confidence
            )));
        }
        if let Some(r) = radius {
            if !r.is_finite() || r < 0.0 {
                return Err(LesionMatchError::Validation(format!(
                    "response '{}' in {} has invalid radius {}",
                    name, case, r
                )));
            }
        }
        if !coords.is_finite() {
            return Err(LesionMatchError::Validation(format!(
                "response '{}' in {} has non-finite position {}",
                name, case, coords
            )));
        }

        Ok(Self {
            name,
            coords,
            confidence,
            radius,
            case,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coords(&self) -> Coordinates {
        self.coords
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    pub fn case(&self) -> &CaseKey {
        &self.case
    }

    /// Total order used for tie-breaking and output
    ///
    /// Name first, then position, confidence and radius so that two marks
    /// sharing a name still order deterministically.
    pub fn canonical_cmp(&self, other: &Response) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.coords.total_cmp(&other.coords))
            .then_with(|| self.confidence.total_cmp(&other.confidence))
            .then_with(|| match (self.radius, other.radius) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
    }
}
