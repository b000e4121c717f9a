//! Reading reference lesions and rater responses for a case
//!
//! Loaders hand the matcher in-memory entities in physical coordinates.
//! The bundled [`JsonLoader`] reads annotation files of the form:
//!
//! ```json
//! {
//!   "annotations": [
//!     { "name": "nodule 4", "points": [[10.0, 12.5, -30.0], [11.0, 12.5, -30.0]] },
//!     { "name": "mass", "confidence": 2, "points": [[0, 0, 0]], "radius": 3.5 }
//!   ]
//! }
//! ```

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{LesionMatchError, Result};
use crate::geometry::fit_enclosing_sphere;
use crate::layout::ExperimentLayout;
use crate::rater::CaseInput;
use crate::types::{CaseKey, Coordinates, Lesion, Response};

/// Confidence assigned when neither the file nor the name carries one
pub const UNKNOWN_CONFIDENCE: f64 = -1.0;

/// Source of lesions and responses for the matcher
pub trait Loader {
    /// Reference lesions of a case
    fn load_lesions(&self, case: &CaseKey) -> Result<Vec<Lesion>>;

    /// One rater's responses for a case
    fn load_responses(&self, rater: &str, case: &CaseKey) -> Result<Vec<Response>>;

    /// Lesions and responses of a case, ready for classification
    fn load(&self, rater: &str, case: &CaseKey) -> Result<CaseInput> {
        Ok(CaseInput::new(
            case.clone(),
            self.load_lesions(case)?,
            self.load_responses(rater, case)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct AnnotationFile {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    name: String,
    points: Vec<[f64; 3]>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    radius: Option<f64>,
}

/// Loads `*.json` annotation files from an [`ExperimentLayout`]
#[derive(Debug, Clone)]
pub struct JsonLoader {
    layout: ExperimentLayout,
    min_lesion_radius: f64,
}

impl JsonLoader {
    pub fn new(layout: ExperimentLayout) -> Self {
        Self {
            layout,
            min_lesion_radius: 0.0,
        }
    }

    /// Builder: Floor applied to fitted lesion radii
    pub fn min_lesion_radius(mut self, radius: f64) -> Self {
        self.min_lesion_radius = radius.max(0.0);
        self
    }

    pub fn layout(&self) -> &ExperimentLayout {
        &self.layout
    }

    fn read_annotations(dir: &Path) -> Result<Vec<(PathBuf, Annotation)>> {
        if !dir.is_dir() {
            debug!("No annotation directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        paths.sort();

        let mut annotations = Vec::new();
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let file: AnnotationFile = serde_json::from_str(&text).map_err(|e| {
                LesionMatchError::Annotation(format!("{}: {}", path.display(), e))
            })?;
            if file.annotations.is_empty() {
                warn!("{} contains no annotations", path.display());
            }
            annotations.extend(file.annotations.into_iter().map(|a| (path.clone(), a)));
        }
        Ok(annotations)
    }
}

fn to_points(annotation: &Annotation) -> Vec<Coordinates> {
    annotation.points.iter().copied().map(Coordinates::from).collect()
}

impl Loader for JsonLoader {
    fn load_lesions(&self, case: &CaseKey) -> Result<Vec<Lesion>> {
        let dir = self.layout.reference_case_dir(case);
        Self::read_annotations(&dir)?
            .into_iter()
            .map(|(path, annotation)| {
                // Lesion confidence carries no meaning and is dropped
                Lesion::from_points(
                    annotation.name.clone(),
                    case.clone(),
                    &to_points(&annotation),
                    self.min_lesion_radius,
                )
                .map_err(|e| annotation_error(&path, &annotation.name, e))
            })
            .collect()
    }

    fn load_responses(&self, rater: &str, case: &CaseKey) -> Result<Vec<Response>> {
        let dir = self.layout.rater_case_dir(rater, case);
        Self::read_annotations(&dir)?
            .into_iter()
            .map(|(path, annotation)| {
                let sphere = fit_enclosing_sphere(&to_points(&annotation))
                    .map_err(|e| annotation_error(&path, &annotation.name, e))?;
                let confidence = annotation
                    .confidence
                    .or_else(|| parse_confidence_from_name(&annotation.name))
                    .unwrap_or(UNKNOWN_CONFIDENCE);
                Response::new(
                    annotation.name.clone(),
                    case.clone(),
                    sphere.center,
                    confidence,
                    Some(annotation.radius.unwrap_or(sphere.radius)),
                )
                .map_err(|e| annotation_error(&path, &annotation.name, e))
            })
            .collect()
    }
}

/// Prefixes an entity error with the file and annotation it came from
fn annotation_error(path: &Path, name: &str, e: LesionMatchError) -> LesionMatchError {
    let context = format!("{} ('{}')", path.display(), name);
    match e {
        LesionMatchError::Geometry(msg) => LesionMatchError::Geometry(format!("{}: {}", context, msg)),
        LesionMatchError::Validation(msg) => {
            LesionMatchError::Validation(format!("{}: {}", context, msg))
        }
        other => other,
    }
}

/// Takes the first integer in an annotation name as its confidence
///
/// Segmentation tools typically only let raters name a segment, so ratings
/// are written into the name, e.g. "lesion 4" or "R3".
pub fn parse_confidence_from_name(name: &str) -> Option<f64> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(r"[0-9]+").expect("Failed to compile regex"));
    re.find(name).and_then(|m| m.as_str().parse::<f64>().ok())
}
