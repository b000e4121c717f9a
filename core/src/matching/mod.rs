//! Assignment of rater responses to reference lesions
//!
//! A classifier takes every lesion and response of one case and produces a
//! [`MatchResult`]: matched pairs (true positives), unmatched lesions (false
//! negatives) and unmatched responses (false positives). Classifiers are
//! selected by [`Criteria`] rather than by type, so a run can be configured
//! without code changes.

mod deferred;
mod result;

pub use deferred::WithinLesionClassifier;
pub use result::{MatchResult, MatchedPair};

use crate::error::{LesionMatchError, Result};
use crate::types::{CaseKey, Criteria, Lesion, Response};

/// Classifies the responses of one case against its lesions
pub trait Classifier: Send + Sync {
    /// Produces the match result for one case
    ///
    /// # Errors
    ///
    /// Returns [`LesionMatchError::Matching`] if any lesion or response
    /// belongs to a different case. Ambiguous assignments never fail.
    fn classify(
        &self,
        case: &CaseKey,
        lesions: &[Lesion],
        responses: &[Response],
    ) -> Result<MatchResult>;
}

/// Returns the classifier selected by `criteria`
pub fn classifier_for(criteria: Criteria) -> Box<dyn Classifier> {
    match criteria {
        Criteria::WithinLesion => Box::new(WithinLesionClassifier),
    }
}

/// Rejects lesions or responses that were loaded under another case
pub(crate) fn check_case_scope(
    case: &CaseKey,
    lesions: &[Lesion],
    responses: &[Response],
) -> Result<()> {
    if let Some(lesion) = lesions.iter().find(|l| l.case() != case) {
        return Err(LesionMatchError::Matching(format!(
            "lesion '{}' belongs to {} but was classified under {}",
            lesion.id(),
            lesion.case(),
            case
        )));
    }
    if let Some(response) = responses.iter().find(|r| r.case() != case) {
        return Err(LesionMatchError::Matching(format!(
            "response '{}' belongs to {} but was classified under {}",
            response.name(),
            response.case(),
            case
        )));
    }
    Ok(())
}
