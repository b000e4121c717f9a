//! Experiment directory layout
//!
//! ```text
//! <root>/reference/<patient>/<YYYYMMDD>_<MOD>/SE<n>/
//! <root>/raters/<rater>/<patient>/<YYYYMMDD>_<MOD>/SE<n>/
//! ```
//!
//! The layout is discovered once into an [`ExperimentLayout`] value that is
//! handed to the loader; nothing downstream looks at the filesystem tree.

use dicom_object::open_file;
use log::{info, warn};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{LesionMatchError, Result};
use crate::extraction::extract_case_key;
use crate::types::CaseKey;

pub const REFERENCE_DIR_NAME: &str = "reference";
pub const RATERS_DIR_NAME: &str = "raters";

/// Reference cases and rater trees found under an experiment root
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentLayout {
    root: PathBuf,
    reference_cases: Vec<CaseKey>,
    rater_cases: BTreeMap<String, Vec<CaseKey>>,
}

impl ExperimentLayout {
    /// Builds a layout from already known parts
    pub fn new(
        root: impl Into<PathBuf>,
        reference_cases: Vec<CaseKey>,
        rater_cases: BTreeMap<String, Vec<CaseKey>>,
    ) -> Self {
        Self {
            root: root.into(),
            reference_cases,
            rater_cases,
        }
    }

    /// Scans `root` for reference cases, raters, and each rater's cases
    ///
    /// # Errors
    ///
    /// Returns [`LesionMatchError::Layout`] if the reference tree is missing,
    /// or a rater has a case with no reference counterpart.
    pub fn discover(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let reference_dir = root.join(REFERENCE_DIR_NAME);
        if !reference_dir.is_dir() {
            return Err(LesionMatchError::Layout(format!(
                "{} has no '{}' directory",
                root.display(),
                REFERENCE_DIR_NAME
            )));
        }
        let reference_cases = list_cases(&reference_dir)?;
        let known: BTreeSet<&CaseKey> = reference_cases.iter().collect();

        let mut rater_cases = BTreeMap::new();
        let raters_dir = root.join(RATERS_DIR_NAME);
        if raters_dir.is_dir() {
            for rater_dir in sorted_subdirs(&raters_dir)? {
                let Some(rater) = rater_dir.file_name().and_then(|n| n.to_str()) else {
                    warn!("Skipping non UTF-8 rater directory {}", rater_dir.display());
                    continue;
                };
                let cases = list_cases(&rater_dir)?;
                if let Some(orphan) = cases.iter().find(|c| !known.contains(c)) {
                    return Err(LesionMatchError::Layout(format!(
                        "rater '{}' has case {} with no reference directory",
                        rater, orphan
                    )));
                }
                rater_cases.insert(rater.to_string(), cases);
            }
        } else {
            warn!("{} has no '{}' directory", root.display(), RATERS_DIR_NAME);
        }

        info!(
            "Found {} reference case(s) and {} rater(s) in {}",
            reference_cases.len(),
            rater_cases.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            reference_cases,
            rater_cases,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reference cases in canonical order
    pub fn reference_cases(&self) -> &[CaseKey] {
        &self.reference_cases
    }

    /// Rater names in sorted order
    pub fn raters(&self) -> impl Iterator<Item = &str> {
        self.rater_cases.keys().map(String::as_str)
    }

    /// Cases present in a rater's tree
    pub fn rater_cases(&self, rater: &str) -> &[CaseKey] {
        self.rater_cases
            .get(rater)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reference_case_dir(&self, case: &CaseKey) -> PathBuf {
        self.root.join(REFERENCE_DIR_NAME).join(case.relative_dir())
    }

    pub fn rater_case_dir(&self, rater: &str, case: &CaseKey) -> PathBuf {
        self.root
            .join(RATERS_DIR_NAME)
            .join(rater)
            .join(case.relative_dir())
    }
}

/// Parses `<date>_<MOD>` and `SE<n>` directory names
fn study_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^([0-9]{8})_([A-Z]{2})$").expect("Failed to compile regex"))
}

fn series_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^SE([0-9]+)$").expect("Failed to compile regex"))
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Lists case directories three levels below `tree_root`
fn list_cases(tree_root: &Path) -> Result<Vec<CaseKey>> {
    let mut cases = Vec::new();

    for patient_dir in sorted_subdirs(tree_root)? {
        let Some(patient_id) = dir_name(&patient_dir) else {
            continue;
        };
        for study_dir in sorted_subdirs(&patient_dir)? {
            let Some(caps) = dir_name(&study_dir).and_then(|n| study_regex().captures(n)) else {
                continue;
            };
            for series_dir in sorted_subdirs(&study_dir)? {
                if let Some(series) = dir_name(&series_dir).and_then(|n| series_regex().captures(n))
                {
                    cases.push(CaseKey::new(
                        patient_id,
                        &caps[1],
                        &caps[2],
                        &series[1],
                    ));
                }
            }
        }
    }

    cases.sort();
    cases.dedup();
    Ok(cases)
}

/// Scaffolds an experiment tree from a directory of DICOM images
///
/// Every distinct (patient, study date, modality, series) found under
/// `dicom_dir` gets a case directory in the reference tree and in each of
/// `rater01` .. `raterNN`. Files that are not readable DICOM are skipped.
///
/// # Errors
///
/// Returns [`LesionMatchError::Validation`] if `num_raters` is zero, and
/// I/O errors from walking or creating directories.
pub fn prepare(
    dicom_dir: &Path,
    target_dir: &Path,
    num_raters: usize,
) -> Result<BTreeSet<CaseKey>> {
    if num_raters == 0 {
        return Err(LesionMatchError::Validation(
            "number of raters must be greater than 0".to_string(),
        ));
    }

    let files = collect_dicom_files(dicom_dir)?;
    info!("Found {} DICOM file(s) in {}", files.len(), dicom_dir.display());

    let mut cases = BTreeSet::new();
    for path in &files {
        match open_file(path)
            .map_err(LesionMatchError::from)
            .and_then(|dcm| extract_case_key(&dcm))
        {
            Ok(case) => {
                cases.insert(case);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    if cases.is_empty() {
        warn!("No series found; nothing to prepare");
        return Ok(cases);
    }

    create_case_dirs(&target_dir.join(REFERENCE_DIR_NAME), &cases)?;
    for i in 1..=num_raters {
        let rater_dir = target_dir
            .join(RATERS_DIR_NAME)
            .join(format!("rater{:02}", i));
        create_case_dirs(&rater_dir, &cases)?;
    }

    info!("A total of {} series was found", cases.len());
    Ok(cases)
}

fn create_case_dirs(tree_root: &Path, cases: &BTreeSet<CaseKey>) -> Result<()> {
    for case in cases {
        fs::create_dir_all(tree_root.join(case.relative_dir()))?;
    }
    Ok(())
}

/// Recursively collects DICOM files by extension or header magic
fn collect_dicom_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![directory.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                let by_extension = path.extension().is_some_and(|ext| {
                    ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom")
                });
                if by_extension || is_dicom_file(&path) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the 128-byte preamble followed by the "DICM" magic
fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn make_case_dirs(root: &Path, tree: &str, cases: &[CaseKey]) {
        for case in cases {
            fs::create_dir_all(root.join(tree).join(case.relative_dir())).unwrap();
        }
    }

    fn cases() -> Vec<CaseKey> {
        vec![
            CaseKey::new("P001", "20240102", "CT", "3"),
            CaseKey::new("P001", "20240102", "MR", "10"),
            CaseKey::new("P002", "20231224", "CT", "1"),
        ]
    }

    #[test]
    fn test_discover() {
        let tmp = TempDir::new().unwrap();
        make_case_dirs(tmp.path(), "reference", &cases());
        make_case_dirs(tmp.path(), "raters/rater01", &cases());
        make_case_dirs(tmp.path(), "raters/rater02", &cases()[..1]);
        // Noise that does not follow the convention
        fs::create_dir_all(tmp.path().join("reference/P001/notes")).unwrap();
        fs::create_dir_all(tmp.path().join("reference/P001/20240102_CT/extra")).unwrap();

        let layout = ExperimentLayout::discover(tmp.path()).unwrap();
        assert_eq!(layout.reference_cases(), cases().as_slice());
        assert_eq!(layout.raters().collect::<Vec<_>>(), vec!["rater01", "rater02"]);
        assert_eq!(layout.rater_cases("rater02"), &cases()[..1]);
        assert!(layout.rater_cases("nobody").is_empty());
        assert_eq!(
            layout.rater_case_dir("rater01", &cases()[0]),
            tmp.path().join("raters/rater01/P001/20240102_CT/SE3")
        );
    }

    #[test]
    fn test_discover_without_reference_fails() {
        let tmp = TempDir::new().unwrap();
        let err = ExperimentLayout::discover(tmp.path()).unwrap_err();
        assert!(matches!(err, LesionMatchError::Layout(_)));
    }

    #[test]
    fn test_discover_orphan_rater_case_fails() {
        let tmp = TempDir::new().unwrap();
        make_case_dirs(tmp.path(), "reference", &cases()[..1]);
        make_case_dirs(tmp.path(), "raters/rater01", &cases());
        let err = ExperimentLayout::discover(tmp.path()).unwrap_err();
        assert!(matches!(err, LesionMatchError::Layout(_)));
    }

    #[test]
    fn test_prepare_requires_raters() {
        let tmp = TempDir::new().unwrap();
        let err = prepare(tmp.path(), tmp.path(), 0).unwrap_err();
        assert!(matches!(err, LesionMatchError::Validation(_)));
    }

    #[test]
    fn test_prepare_skips_unreadable_files() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let mut file = File::create(src.path().join("broken.dcm")).unwrap();
        file.write_all(b"not a dicom file").unwrap();

        let cases = prepare(src.path(), dst.path(), 3).unwrap();
        assert!(cases.is_empty());
        assert!(!dst.path().join(REFERENCE_DIR_NAME).exists());
    }

    #[test]
    fn test_collect_dicom_files_recursive() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        File::create(tmp.path().join("top.dcm")).unwrap();
        File::create(tmp.path().join("a/b/deep.DICOM")).unwrap();
        File::create(tmp.path().join("a/readme.txt")).unwrap();

        let mut headerless = File::create(tmp.path().join("a/IM0001")).unwrap();
        headerless.write_all(&[0u8; 128]).unwrap();
        headerless.write_all(b"DICM").unwrap();

        let files = collect_dicom_files(tmp.path()).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_is_dicom_file_too_small() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("small");
        File::create(&path).unwrap().write_all(b"small").unwrap();
        assert!(!is_dicom_file(&path));
    }
}
