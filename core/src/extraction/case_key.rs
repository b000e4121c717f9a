use dicom_object::InMemDicomObject;

use super::tags::{get_int_value, get_string_value, MODALITY, PATIENT_ID, SERIES_NUMBER, STUDY_DATE};
use crate::error::{LesionMatchError, Result};
use crate::types::CaseKey;

/// Extracts the case key (patient, study date, modality, series) of an image
///
/// # Errors
///
/// Returns [`LesionMatchError::Dicom`] if any of the four tags is missing or
/// empty.
pub fn extract_case_key(dcm: &InMemDicomObject) -> Result<CaseKey> {
    let required = |tag, name: &str| {
        get_string_value(dcm, tag)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LesionMatchError::Dicom(format!("missing {}", name)))
    };

    let patient_id = required(PATIENT_ID, "PatientID")?;
    let study_date = required(STUDY_DATE, "StudyDate")?;
    let modality = required(MODALITY, "Modality")?.to_uppercase();
    // Normalise "007" and "7" to the same series
    let series = match get_int_value(dcm, SERIES_NUMBER) {
        Some(n) => n.to_string(),
        None => required(SERIES_NUMBER, "SeriesNumber")?,
    };

    Ok(CaseKey::new(patient_id, study_date, modality, series))
}
