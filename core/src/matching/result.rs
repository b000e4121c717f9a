use serde::Serialize;

use crate::aggregator::{Label, Record};
use crate::types::{CaseKey, Lesion, Response};

/// A response accepted by a lesion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub lesion: Lesion,
    pub response: Response,
    /// Distance from the lesion center to the response point
    pub distance: f64,
}

/// Outcome of classifying one case for one rater
///
/// All three lists are in canonical order (lesions by id, responses by
/// name), independent of the order the inputs were supplied in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub case: CaseKey,
    /// True positives, ordered by lesion
    pub matched: Vec<MatchedPair>,
    /// Lesions no response was matched to
    pub false_negatives: Vec<Lesion>,
    /// Responses not matched to any lesion
    pub false_positives: Vec<Response>,
}

impl MatchResult {
    pub fn true_positive_count(&self) -> usize {
        self.matched.len()
    }

    pub fn false_positive_count(&self) -> usize {
        self.false_positives.len()
    }

    pub fn false_negative_count(&self) -> usize {
        self.false_negatives.len()
    }

    /// Checks whether the case had neither lesions nor responses
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.false_negatives.is_empty() && self.false_positives.is_empty()
    }

    /// Flattens the result into output records for `rater`
    ///
    /// Every response yields exactly one record and every lesion exactly one.
    /// A case with nothing to report yields a single [`Label::NoMarks`] record
    /// so the rater's participation in the case stays visible downstream.
    pub fn records(&self, rater: &str) -> Vec<Record> {
        if self.is_empty() {
            return vec![Record::new(rater, self.case.clone(), None, None, Label::NoMarks)];
        }

        let mut records = Vec::with_capacity(
            self.matched.len() + self.false_negatives.len() + self.false_positives.len(),
        );
        for pair in &self.matched {
            records.push(Record::new(
                rater,
                self.case.clone(),
                Some(pair.lesion.clone()),
                Some(pair.response.clone()),
                Label::TruePositive,
            ));
        }
        for lesion in &self.false_negatives {
            records.push(Record::new(
                rater,
                self.case.clone(),
                Some(lesion.clone()),
                None,
                Label::FalseNegative,
            ));
        }
        for response in &self.false_positives {
            records.push(Record::new(
                rater,
                self.case.clone(),
                None,
                Some(response.clone()),
                Label::FalsePositive,
            ));
        }
        records
    }
}
