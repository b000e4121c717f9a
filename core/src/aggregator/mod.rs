//! Merging per-rater record streams into the canonical output table
//!
//! The table is sorted by (modality, rater, case, lesion, response) so that
//! the output never depends on the order in which raters or cases finished.

mod record;

pub use record::{FlatRow, Label, Record};

use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CompletenessIssue, LesionMatchError, Result};
use crate::types::{CaseKey, Lesion};

/// Collects records, the cases each rater was assigned, and the reference
/// lesions of every case
#[derive(Debug, Default)]
pub struct Aggregator {
    assignments: BTreeMap<String, BTreeSet<CaseKey>>,
    records: Vec<Record>,
    truth: BTreeMap<CaseKey, Vec<Lesion>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `rater` is expected to report on every case in `cases`
    pub fn assign<I>(&mut self, rater: &str, cases: I)
    where
        I: IntoIterator<Item = CaseKey>,
    {
        self.assignments
            .entry(rater.to_string())
            .or_default()
            .extend(cases);
    }

    /// Declares the reference lesions of a case
    ///
    /// Declared cases stay in the table even when no rater reported on them.
    pub fn add_truth<I>(&mut self, case: CaseKey, lesions: I)
    where
        I: IntoIterator<Item = Lesion>,
    {
        self.truth.entry(case).or_default().extend(lesions);
    }

    /// Adds a rater's record stream
    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        self.records.extend(records);
    }

    /// Sorts the records and checks every assignment was honoured
    ///
    /// Completeness problems are collected, not raised, so the caller can
    /// decide whether partial data is acceptable.
    pub fn finish(mut self) -> Aggregation {
        self.records.sort_by(|a, b| a.canonical_cmp(b));
        for lesions in self.truth.values_mut() {
            lesions.sort_by(|a, b| a.canonical_cmp(b));
            lesions.dedup_by(|a, b| a.canonical_cmp(b).is_eq());
        }

        let contributed: BTreeSet<(&str, &CaseKey)> = self
            .records
            .iter()
            .map(|r| (r.rater.as_str(), &r.case))
            .collect();

        let mut issues = Vec::new();
        for (rater, cases) in &self.assignments {
            for case in cases {
                if !contributed.contains(&(rater.as_str(), case)) {
                    issues.push(CompletenessIssue {
                        rater: rater.clone(),
                        case: case.clone(),
                    });
                }
            }
        }

        for issue in &issues {
            warn!("Incomplete: {}", issue);
        }
        info!(
            "Aggregated {} record(s) from {} rater(s)",
            self.records.len(),
            self.assignments.len()
        );

        Aggregation {
            table: RecordTable {
                records: self.records,
                truth: self.truth,
            },
            issues,
        }
    }
}

/// Sorted table plus any completeness problems found while building it
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: RecordTable,
    pub issues: Vec<CompletenessIssue>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the table, or every completeness issue as one error
    pub fn into_complete(self) -> Result<RecordTable> {
        if self.issues.is_empty() {
            Ok(self.table)
        } else {
            Err(LesionMatchError::Completeness(self.issues))
        }
    }
}

/// Records in canonical order, plus the declared reference lesions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<Record>,
    truth: BTreeMap<CaseKey, Vec<Lesion>>,
}

impl RecordTable {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flat rows in table order, for writers
    pub fn rows(&self) -> Vec<FlatRow> {
        self.records.iter().map(Record::to_row).collect()
    }

    /// Distinct rater names in table order
    pub fn raters(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .map(|r| r.rater.as_str())
            .filter(|r| seen.insert(*r))
            .collect()
    }

    /// Reference lesions per declared case, in canonical lesion order
    pub fn truth(&self) -> &BTreeMap<CaseKey, Vec<Lesion>> {
        &self.truth
    }

    /// Distinct cases in canonical case order, from records and declared truth
    pub fn cases(&self) -> Vec<&CaseKey> {
        let set: BTreeSet<&CaseKey> = self
            .records
            .iter()
            .map(|r| &r.case)
            .chain(self.truth.keys())
            .collect();
        set.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
