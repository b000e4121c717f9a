//! End-to-end evaluation of an experiment
//!
//! Every rater is expected to report on every reference case. Reference
//! lesions are loaded once and shared by all raters; each rater's cases are
//! classified independently and the record streams are merged into one
//! canonical table.

use indicatif::ProgressBar;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

use crate::aggregator::{Aggregation, Aggregator};
use crate::error::{LesionMatchError, Result};
use crate::layout::ExperimentLayout;
use crate::loader::{JsonLoader, Loader};
use crate::rater::{CaseInput, Rater};
use crate::types::{CaseKey, EvaluationConfig, Lesion};

/// Evaluates every rater in `layout` using `loader`
///
/// # Errors
///
/// Returns the first loading or matching error. Unless
/// `config.allow_incomplete` is set, a rater that has no records for an
/// assigned case yields [`LesionMatchError::Completeness`] listing every
/// missing pair.
pub fn evaluate<L>(
    layout: &ExperimentLayout,
    loader: &L,
    config: &EvaluationConfig,
) -> Result<Aggregation>
where
    L: Loader + ?Sized,
{
    evaluate_with_progress(layout, loader, config, &ProgressBar::hidden())
}

/// Same as [`evaluate`], advancing `progress` once per rater
pub fn evaluate_with_progress<L>(
    layout: &ExperimentLayout,
    loader: &L,
    config: &EvaluationConfig,
    progress: &ProgressBar,
) -> Result<Aggregation>
where
    L: Loader + ?Sized,
{
    let mut lesions: BTreeMap<CaseKey, Vec<Lesion>> = BTreeMap::new();
    for case in layout.reference_cases() {
        let found = loader.load_lesions(case)?;
        debug!("{}: {} lesion(s)", case, found.len());
        lesions.insert(case.clone(), found);
    }
    info!(
        "Loaded {} lesion(s) in {} reference case(s)",
        lesions.values().map(Vec::len).sum::<usize>(),
        lesions.len()
    );

    let mut aggregator = Aggregator::new();
    for (case, found) in &lesions {
        aggregator.add_truth(case.clone(), found.iter().cloned());
    }

    let raters: Vec<&str> = layout.raters().collect();
    progress.set_length(raters.len() as u64);

    for rater_id in raters {
        progress.set_message(rater_id.to_string());
        aggregator.assign(rater_id, layout.reference_cases().iter().cloned());

        let mut inputs = Vec::new();
        for case in layout.rater_cases(rater_id) {
            let case_lesions = match lesions.get(case) {
                Some(found) => found.clone(),
                None => loader.load_lesions(case)?,
            };
            let responses = loader.load_responses(rater_id, case)?;
            inputs.push(CaseInput::new(case.clone(), case_lesions, responses));
        }

        let mut rater = Rater::from_config(rater_id, config);
        aggregator.extend(rater.evaluate(&inputs)?);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let aggregation = aggregator.finish();
    if !aggregation.is_complete() && !config.allow_incomplete {
        return Err(LesionMatchError::Completeness(aggregation.issues));
    }
    Ok(aggregation)
}

/// Discovers the experiment at `root` and evaluates its JSON annotations
pub fn evaluate_dir(root: impl AsRef<Path>, config: &EvaluationConfig) -> Result<Aggregation> {
    let layout = ExperimentLayout::discover(root)?;
    let loader = JsonLoader::new(layout.clone()).min_lesion_radius(config.min_lesion_radius);
    evaluate(&layout, &loader, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Label;
    use crate::types::{Coordinates, Response};

    #[derive(Default)]
    struct MemoryLoader {
        lesions: BTreeMap<CaseKey, Vec<Lesion>>,
        responses: BTreeMap<(String, CaseKey), Vec<Response>>,
    }

    impl Loader for MemoryLoader {
        fn load_lesions(&self, case: &CaseKey) -> Result<Vec<Lesion>> {
            Ok(self.lesions.get(case).cloned().unwrap_or_default())
        }

        fn load_responses(&self, rater: &str, case: &CaseKey) -> Result<Vec<Response>> {
            Ok(self
                .responses
                .get(&(rater.to_string(), case.clone()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn case(series: &str) -> CaseKey {
        CaseKey::new("P001", "20240102", "CT", series)
    }

    fn fixture() -> (ExperimentLayout, MemoryLoader) {
        let mut loader = MemoryLoader::default();
        loader.lesions.insert(
            case("1"),
            vec![Lesion::new("L1", case("1"), Coordinates::default(), 5.0).unwrap()],
        );
        loader.responses.insert(
            ("rater01".to_string(), case("1")),
            vec![
                Response::new("hit", case("1"), Coordinates::new(1.0, 0.0, 0.0), 4.0, None)
                    .unwrap(),
                Response::new("miss", case("1"), Coordinates::new(20.0, 0.0, 0.0), 2.0, None)
                    .unwrap(),
            ],
        );

        let mut rater_cases = BTreeMap::new();
        rater_cases.insert("rater01".to_string(), vec![case("1"), case("2")]);
        rater_cases.insert("rater02".to_string(), vec![case("1"), case("2")]);
        let layout = ExperimentLayout::new("exp", vec![case("1"), case("2")], rater_cases);
        (layout, loader)
    }

    #[test]
    fn test_evaluate_labels() {
        let (layout, loader) = fixture();
        let aggregation = evaluate(&layout, &loader, &EvaluationConfig::default()).unwrap();
        assert!(aggregation.is_complete());

        let labels: Vec<(&str, &str, Label)> = aggregation
            .table
            .iter()
            .map(|r| (r.rater.as_str(), r.case.series.as_str(), r.label))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("rater01", "1", Label::FalsePositive),
                ("rater01", "1", Label::TruePositive),
                ("rater01", "2", Label::NoMarks),
                ("rater02", "1", Label::FalseNegative),
                ("rater02", "2", Label::NoMarks),
            ]
        );
    }

    #[test]
    fn test_missing_rater_case_fails() {
        let (full, loader) = fixture();
        let mut rater_cases = BTreeMap::new();
        rater_cases.insert("rater01".to_string(), vec![case("1")]);
        let layout =
            ExperimentLayout::new(full.root(), full.reference_cases().to_vec(), rater_cases);

        match evaluate(&layout, &loader, &EvaluationConfig::default()) {
            Err(LesionMatchError::Completeness(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].rater, "rater01");
                assert_eq!(issues[0].case, case("2"));
            }
            other => panic!("expected completeness error, got {:?}", other.map(|a| a.table)),
        }

        let config = EvaluationConfig::default().allow_incomplete(true);
        let aggregation = evaluate(&layout, &loader, &config).unwrap();
        assert_eq!(aggregation.issues.len(), 1);
        assert_eq!(aggregation.table.len(), 2);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let (layout, loader) = fixture();
        let parallel = evaluate(&layout, &loader, &EvaluationConfig::default()).unwrap();
        let sequential =
            evaluate(&layout, &loader, &EvaluationConfig::default().parallel(false)).unwrap();
        assert_eq!(parallel.table, sequential.table);
    }
}
