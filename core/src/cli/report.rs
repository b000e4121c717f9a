use std::collections::BTreeMap;
use std::fmt;

use crate::aggregator::{Aggregation, Label};

/// Text summary of an evaluation: counts per modality and rater
pub struct TextReport<'a> {
    aggregation: &'a Aggregation,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(aggregation: &'a Aggregation) -> Self {
        Self { aggregation }
    }
}

#[derive(Default)]
struct Counts {
    cases: usize,
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.aggregation.table;

        let mut counts: BTreeMap<(&str, &str), Counts> = BTreeMap::new();
        let mut last_case = None;
        for record in table {
            let entry = counts
                .entry((record.modality.as_str(), record.rater.as_str()))
                .or_default();
            let key = (&record.modality, &record.rater, &record.case);
            if last_case != Some(key) {
                entry.cases += 1;
                last_case = Some(key);
            }
            match record.label {
                Label::TruePositive => entry.tp += 1,
                Label::FalsePositive => entry.fp += 1,
                Label::FalseNegative => entry.fn_ += 1,
                Label::NoMarks => {}
            }
        }

        writeln!(f, "FROC Evaluation Summary")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Records:        {}", table.len())?;
        writeln!(f, "Cases:          {}", table.cases().len())?;
        writeln!(f, "Raters:         {}", table.raters().len())?;
        writeln!(f)?;

        for ((modality, rater), c) in &counts {
            writeln!(f, "{} / {}", modality, rater)?;
            writeln!(f, "  Cases: {}", c.cases)?;
            writeln!(f, "  TP:    {}", c.tp)?;
            writeln!(f, "  FP:    {}", c.fp)?;
            writeln!(f, "  FN:    {}", c.fn_)?;
            let lesions = c.tp + c.fn_;
            if lesions > 0 {
                writeln!(
                    f,
                    "  Sensitivity: {:.3}",
                    c.tp as f64 / lesions as f64
                )?;
            }
            writeln!(f)?;
        }

        if !self.aggregation.issues.is_empty() {
            writeln!(f, "Missing Reports")?;
            writeln!(f, "---------------")?;
            for issue in &self.aggregation.issues {
                writeln!(f, "{}", issue)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, Record};
    use crate::types::{CaseKey, Coordinates, Lesion, Response};

    #[test]
    fn test_text_report_format() {
        let case = CaseKey::new("P001", "20240102", "CT", "3");
        let lesion = Lesion::new("L1", case.clone(), Coordinates::default(), 5.0).unwrap();
        let hit = Response::new("hit", case.clone(), Coordinates::default(), 3.0, None).unwrap();
        let stray = Response::new("stray", case.clone(), Coordinates::new(9.0, 0.0, 0.0), 1.0, None)
            .unwrap();

        let mut agg = Aggregator::new();
        agg.assign("rater01", vec![case.clone()]);
        agg.assign("rater02", vec![case.clone()]);
        agg.extend(vec![
            Record::new("rater01", case.clone(), Some(lesion), Some(hit), Label::TruePositive),
            Record::new("rater01", case, None, Some(stray), Label::FalsePositive),
        ]);
        let aggregation = agg.finish();

        let output = format!("{}", TextReport::new(&aggregation));
        assert!(output.contains("FROC Evaluation Summary"));
        assert!(output.contains("CT / rater01"));
        assert!(output.contains("  Cases: 1"));
        assert!(output.contains("  TP:    1"));
        assert!(output.contains("  FP:    1"));
        assert!(output.contains("  Sensitivity: 1.000"));
        assert!(output.contains("rater 'rater02' has no records for case P001/20240102_CT/SE3"));
    }
}
