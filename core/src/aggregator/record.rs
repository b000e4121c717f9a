use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::types::{CaseKey, Lesion, Response};

/// Classification of an output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    /// Response matched to a lesion
    TruePositive,
    /// Response not matched to any lesion
    FalsePositive,
    /// Lesion without a matched response
    FalseNegative,
    /// Rater reviewed a lesion-free case and marked nothing
    NoMarks,
}

impl Label {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Label::TruePositive => "TP",
            Label::FalsePositive => "FP",
            Label::FalseNegative => "FN",
            Label::NoMarks => "none",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// One row of the canonical output table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub rater: String,
    pub modality: String,
    pub case: CaseKey,
    pub lesion: Option<Lesion>,
    pub response: Option<Response>,
    /// Confidence of the response, if there is one
    pub confidence: Option<f64>,
    pub label: Label,
}

impl Record {
    pub fn new(
        rater: &str,
        case: CaseKey,
        lesion: Option<Lesion>,
        response: Option<Response>,
        label: Label,
    ) -> Self {
        Self {
            rater: rater.to_string(),
            modality: case.modality.clone(),
            confidence: response.as_ref().map(Response::confidence),
            case,
            lesion,
            response,
            label,
        }
    }

    /// Canonical order: modality, rater, case, lesion, response
    ///
    /// A missing lesion or response sorts before any present one.
    pub fn canonical_cmp(&self, other: &Record) -> Ordering {
        self.modality
            .cmp(&other.modality)
            .then_with(|| self.rater.cmp(&other.rater))
            .then_with(|| self.case.cmp(&other.case))
            .then_with(|| match (&self.lesion, &other.lesion) {
                (Some(a), Some(b)) => a.canonical_cmp(b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
            .then_with(|| match (&self.response, &other.response) {
                (Some(a), Some(b)) => a.canonical_cmp(b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
            .then_with(|| self.label.cmp(&other.label))
    }

    /// Flattens the record into plain columns for writers
    pub fn to_row(&self) -> FlatRow {
        FlatRow {
            rater: self.rater.clone(),
            modality: self.modality.clone(),
            patient_id: self.case.patient_id.clone(),
            study_date: self.case.study_date.clone(),
            series: self.case.series.clone(),
            lesion_id: self.lesion.as_ref().map(|l| l.id().to_string()),
            lesion_x: self.lesion.as_ref().map(|l| l.center().x),
            lesion_y: self.lesion.as_ref().map(|l| l.center().y),
            lesion_z: self.lesion.as_ref().map(|l| l.center().z),
            lesion_radius: self.lesion.as_ref().map(Lesion::radius),
            response_name: self.response.as_ref().map(|r| r.name().to_string()),
            response_x: self.response.as_ref().map(|r| r.coords().x),
            response_y: self.response.as_ref().map(|r| r.coords().y),
            response_z: self.response.as_ref().map(|r| r.coords().z),
            confidence: self.confidence,
            label: self.label,
        }
    }
}

/// Record flattened to scalar columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub rater: String,
    pub modality: String,
    pub patient_id: String,
    pub study_date: String,
    pub series: String,
    pub lesion_id: Option<String>,
    pub lesion_x: Option<f64>,
    pub lesion_y: Option<f64>,
    pub lesion_z: Option<f64>,
    pub lesion_radius: Option<f64>,
    pub response_name: Option<String>,
    pub response_x: Option<f64>,
    pub response_y: Option<f64>,
    pub response_z: Option<f64>,
    pub confidence: Option<f64>,
    pub label: Label,
}
