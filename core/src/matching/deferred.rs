use log::debug;
use std::cmp::Ordering;
use std::collections::VecDeque;

use super::{check_case_scope, Classifier, MatchResult, MatchedPair};
use crate::error::Result;
use crate::types::{CaseKey, Lesion, Response};

/// Within-lesion classifier
///
/// A response is eligible for a lesion iff its point lies inside the lesion
/// sphere. Eligible pairs are resolved one-to-one by deferred acceptance with
/// responses proposing:
///
/// - a response prefers the lesion whose center is nearest, then lower
///   lesion id
/// - a lesion prefers the response with higher confidence, then the one
///   nearer its center, then the lower response name
///
/// The result is the response-optimal stable matching. Inputs are put in
/// canonical order first, so the outcome does not depend on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinLesionClassifier;

impl Classifier for WithinLesionClassifier {
    fn classify(
        &self,
        case: &CaseKey,
        lesions: &[Lesion],
        responses: &[Response],
    ) -> Result<MatchResult> {
        check_case_scope(case, lesions, responses)?;

        let mut lesions: Vec<&Lesion> = lesions.iter().collect();
        lesions.sort_by(|a, b| a.canonical_cmp(b));
        let mut responses: Vec<&Response> = responses.iter().collect();
        responses.sort_by(|a, b| a.canonical_cmp(b));

        let preferences: Vec<Vec<usize>> = responses
            .iter()
            .map(|response| eligible_lesions(&lesions, response))
            .collect();

        let held = deferred_acceptance(&lesions, &responses, &preferences);

        let mut accepted = vec![false; responses.len()];
        let mut matched = Vec::new();
        let mut false_negatives = Vec::new();
        for (l, holder) in held.iter().enumerate() {
            match holder {
                Some(r) => {
                    accepted[*r] = true;
                    let response = responses[*r];
                    matched.push(MatchedPair {
                        lesion: lesions[l].clone(),
                        response: response.clone(),
                        distance: lesions[l].distance_to(&response.coords()),
                    });
                }
                None => false_negatives.push(lesions[l].clone()),
            }
        }
        let false_positives: Vec<Response> = responses
            .iter()
            .zip(&accepted)
            .filter(|(_, accepted)| !**accepted)
            .map(|(response, _)| (*response).clone())
            .collect();

        debug!(
            "{}: {} lesion(s), {} response(s) -> TP {}, FP {}, FN {}",
            case,
            lesions.len(),
            responses.len(),
            matched.len(),
            false_positives.len(),
            false_negatives.len()
        );

        Ok(MatchResult {
            case: case.clone(),
            matched,
            false_negatives,
            false_positives,
        })
    }
}

/// Lesions containing the response point, most preferred first
fn eligible_lesions(lesions: &[&Lesion], response: &Response) -> Vec<usize> {
    let point = response.coords();
    let mut eligible: Vec<usize> = (0..lesions.len())
        .filter(|&l| lesions[l].contains(&point))
        .collect();
    eligible.sort_by(|&a, &b| {
        lesions[a]
            .distance_to(&point)
            .total_cmp(&lesions[b].distance_to(&point))
            .then_with(|| lesions[a].canonical_cmp(lesions[b]))
    });
    eligible
}

/// Lesion-side preference: `Less` means `a` is preferred over `b`
fn lesion_preference(lesion: &Lesion, a: &Response, b: &Response) -> Ordering {
    b.confidence()
        .total_cmp(&a.confidence())
        .then_with(|| {
            lesion
                .distance_to(&a.coords())
                .total_cmp(&lesion.distance_to(&b.coords()))
        })
        .then_with(|| a.canonical_cmp(b))
}

/// Runs proposals until every response is held or out of eligible lesions
///
/// Returns, per lesion, the index of the response it holds. Each proposal
/// consumes one eligibility edge, so the loop ends after at most
/// `responses * lesions` proposals.
fn deferred_acceptance(
    lesions: &[&Lesion],
    responses: &[&Response],
    preferences: &[Vec<usize>],
) -> Vec<Option<usize>> {
    let mut held: Vec<Option<usize>> = vec![None; lesions.len()];
    let mut next_choice = vec![0usize; responses.len()];

    // Responses with no eligible lesion are false positives outright
    let mut free: VecDeque<usize> = (0..responses.len())
        .filter(|&r| !preferences[r].is_empty())
        .collect();

    while let Some(r) = free.pop_front() {
        let Some(&l) = preferences[r].get(next_choice[r]) else {
            continue;
        };
        next_choice[r] += 1;

        match held[l] {
            None => held[l] = Some(r),
            Some(current) => {
                if lesion_preference(lesions[l], responses[r], responses[current])
                    == Ordering::Less
                {
                    held[l] = Some(r);
                    free.push_back(current);
                } else {
                    free.push_back(r);
                }
            }
        }
    }

    held
}
