use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One (patient, study, modality, series) scope
///
/// Matching never crosses case boundaries. The derived ordering
/// (patient, study date, modality, series) is the canonical case order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseKey {
    pub patient_id: String,
    pub study_date: String,
    pub modality: String,
    pub series: String,
}

impl CaseKey {
    /// Creates a new CaseKey
    pub fn new(
        patient_id: impl Into<String>,
        study_date: impl Into<String>,
        modality: impl Into<String>,
        series: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            study_date: study_date.into(),
            modality: modality.into(),
            series: series.into(),
        }
    }

    /// Relative directory of this case inside a reference or rater tree
    ///
    /// `<patient>/<date>_<MODALITY>/SE<series>`
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(&self.patient_id)
            .join(format!(
                "{}_{}",
                self.study_date,
                self.modality.to_uppercase()
            ))
            .join(format!("SE{}", self.series))
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}_{}/SE{}",
            self.patient_id, self.study_date, self.modality, self.series
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_dir() {
        let case = CaseKey::new("P001", "20240102", "ct", "3");
        assert_eq!(
            case.relative_dir(),
            PathBuf::from("P001").join("20240102_CT").join("SE3")
        );
    }

    #[test]
    fn test_canonical_order() {
        let a = CaseKey::new("P001", "20240102", "CT", "3");
        let b = CaseKey::new("P001", "20240102", "MR", "1");
        let c = CaseKey::new("P002", "20230101", "CT", "1");
        let mut cases = vec![c.clone(), b.clone(), a.clone()];
        cases.sort();
        assert_eq!(cases, vec![a, b, c]);
    }

    #[test]
    fn test_display() {
        let case = CaseKey::new("P001", "20240102", "CT", "3");
        assert_eq!(case.to_string(), "P001/20240102_CT/SE3");
    }
}
