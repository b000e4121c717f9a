//! Per-rater orchestration of the matcher over every case

use log::{debug, info};
use rayon::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::aggregator::Record;
use crate::error::Result;
use crate::matching::{classifier_for, Classifier, MatchResult};
use crate::types::{CaseKey, EvaluationConfig, Lesion, Response};

/// Lesions and one rater's responses for a single case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseInput {
    pub case: CaseKey,
    pub lesions: Vec<Lesion>,
    pub responses: Vec<Response>,
}

impl CaseInput {
    pub fn new(case: CaseKey, lesions: Vec<Lesion>, responses: Vec<Response>) -> Self {
        Self {
            case,
            lesions,
            responses,
        }
    }
}

/// Runs the classifier once per case for one rater and caches the results
///
/// Cases are independent, so classification runs on the rayon pool when
/// `parallel` is set. A case that was already classified is served from
/// the cache.
pub struct Rater {
    id: String,
    classifier: Box<dyn Classifier>,
    parallel: bool,
    results: BTreeMap<CaseKey, MatchResult>,
}

impl Rater {
    /// Creates a rater using an explicit classifier
    pub fn new(id: impl Into<String>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            id: id.into(),
            classifier,
            parallel: true,
            results: BTreeMap::new(),
        }
    }

    /// Creates a rater with the classifier and parallelism from `config`
    pub fn from_config(id: impl Into<String>, config: &EvaluationConfig) -> Self {
        Self::new(id, classifier_for(config.criteria)).parallel(config.parallel)
    }

    /// Builder: Enable or disable parallel classification
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Classifies one case, or returns the cached result for it
    pub fn classify_case(&mut self, input: &CaseInput) -> Result<&MatchResult> {
        match self.results.entry(input.case.clone()) {
            Entry::Occupied(cached) => Ok(&*cached.into_mut()),
            Entry::Vacant(slot) => {
                let result =
                    self.classifier
                        .classify(&input.case, &input.lesions, &input.responses)?;
                Ok(&*slot.insert(result))
            }
        }
    }

    /// Classifies every case and returns the rater's records in input order
    ///
    /// # Errors
    ///
    /// Propagates the first classification error; no records are returned
    /// in that case.
    pub fn evaluate(&mut self, inputs: &[CaseInput]) -> Result<Vec<Record>> {
        let pending: Vec<&CaseInput> = inputs
            .iter()
            .filter(|input| !self.results.contains_key(&input.case))
            .collect();
        debug!(
            "Rater {}: {} case(s), {} cached",
            self.id,
            inputs.len(),
            inputs.len() - pending.len()
        );

        let classifier = self.classifier.as_ref();
        let classify =
            |input: &&CaseInput| classifier.classify(&input.case, &input.lesions, &input.responses);
        let computed: Vec<MatchResult> = if self.parallel {
            pending.par_iter().map(classify).collect::<Result<_>>()?
        } else {
            pending.iter().map(classify).collect::<Result<_>>()?
        };

        for result in computed {
            self.results.entry(result.case.clone()).or_insert(result);
        }

        let mut records = Vec::new();
        for input in inputs {
            if let Some(result) = self.results.get(&input.case) {
                records.extend(result.records(&self.id));
            }
        }

        info!(
            "Rater {}: {} record(s) from {} case(s)",
            self.id,
            records.len(),
            inputs.len()
        );
        Ok(records)
    }

    /// Looks up the result already computed for `case`
    pub fn result_for(&self, case: &CaseKey) -> Option<&MatchResult> {
        self.results.get(case)
    }

    /// All cached results in canonical case order
    pub fn results(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.values()
    }
}
