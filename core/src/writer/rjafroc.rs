use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::Writer;
use crate::aggregator::{Label, RecordTable};
use crate::error::Result;
use crate::types::{CaseKey, Lesion};

pub const TP_FILE: &str = "TP.csv";
pub const FP_FILE: &str = "FP.csv";
pub const TRUTH_FILE: &str = "TRUTH.csv";
pub const SUPPL_LESIONS_FILE: &str = "Suppl_Lesions.csv";
pub const SUPPL_RATERS_FILE: &str = "Suppl_Raters.csv";

/// Writes FROC tables in the RJafroc layout as CSV files in a directory
///
/// Numeric IDs follow table order: modality and reader IDs start at 0,
/// case IDs at 0, lesion IDs at 1 within a case. A case without lesions
/// gets a single truth row with lesion ID 0 and weight 0.
#[derive(Debug, Clone)]
pub struct RjafrocWriter {
    out_dir: PathBuf,
}

impl RjafrocWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[derive(Debug, Default, Serialize)]
struct TpRow {
    #[serde(rename = "ReaderID")]
    reader_id: Option<usize>,
    #[serde(rename = "ModalityID")]
    modality_id: Option<usize>,
    #[serde(rename = "CaseID")]
    case_id: Option<usize>,
    #[serde(rename = "LesionID")]
    lesion_id: Option<usize>,
    #[serde(rename = "TP_Rating")]
    rating: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
struct FpRow {
    #[serde(rename = "ReaderID")]
    reader_id: Option<usize>,
    #[serde(rename = "ModalityID")]
    modality_id: Option<usize>,
    #[serde(rename = "CaseID")]
    case_id: Option<usize>,
    #[serde(rename = "FP_Rating")]
    rating: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
struct TruthRow {
    #[serde(rename = "CaseID")]
    case_id: Option<usize>,
    #[serde(rename = "LesionID")]
    lesion_id: Option<usize>,
    #[serde(rename = "Weight")]
    weight: Option<f64>,
    #[serde(rename = "ReaderID")]
    reader_ids: String,
    #[serde(rename = "ModalityID")]
    modality_ids: String,
    #[serde(rename = "Paradigm")]
    paradigm: String,
}

#[derive(Debug, Serialize)]
struct LesionRow {
    #[serde(rename = "ModalityID")]
    modality_id: usize,
    modality: String,
    #[serde(rename = "CaseID")]
    case_id: usize,
    patient_id: String,
    study_date: String,
    se_num: String,
    #[serde(rename = "LesionID")]
    lesion_id: usize,
    lesion_name: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    radius: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RaterRow {
    #[serde(rename = "ReaderID")]
    reader_id: usize,
    #[serde(rename = "Rater")]
    rater: String,
}

/// Numeric IDs assigned from the tables content
struct IdAssignment<'a> {
    readers: BTreeMap<&'a str, usize>,
    modalities: BTreeMap<&'a str, usize>,
    cases: BTreeMap<&'a CaseKey, usize>,
    /// Lesions per case in canonical order; lesion ID is position + 1
    lesions: BTreeMap<&'a CaseKey, Vec<&'a Lesion>>,
}

impl<'a> IdAssignment<'a> {
    fn from_table(table: &'a RecordTable) -> Self {
        let readers: BTreeSet<&str> = table.iter().map(|r| r.rater.as_str()).collect();
        let readers = readers.into_iter().enumerate().map(|(i, r)| (r, i)).collect();

        let mut modalities = BTreeMap::new();
        let mut cases = BTreeMap::new();
        for (case_id, case) in table.cases().into_iter().enumerate() {
            let next = modalities.len();
            modalities.entry(case.modality.as_str()).or_insert(next);
            cases.insert(case, case_id);
        }

        let mut lesions: BTreeMap<&CaseKey, Vec<&Lesion>> = BTreeMap::new();
        for (case, truth) in table.truth() {
            lesions.entry(case).or_default().extend(truth);
        }
        for record in table {
            if let Some(lesion) = &record.lesion {
                lesions.entry(&record.case).or_default().push(lesion);
            }
        }
        for list in lesions.values_mut() {
            list.sort_by(|a, b| a.canonical_cmp(b));
            list.dedup_by(|a, b| a.canonical_cmp(b).is_eq());
        }

        Self {
            readers,
            modalities,
            cases,
            lesions,
        }
    }

    fn reader(&self, rater: &str) -> Option<usize> {
        self.readers.get(rater).copied()
    }

    fn modality(&self, modality: &str) -> Option<usize> {
        self.modalities.get(modality).copied()
    }

    fn case(&self, case: &CaseKey) -> Option<usize> {
        self.cases.get(case).copied()
    }

    fn lesion(&self, case: &CaseKey, lesion: &Lesion) -> Option<usize> {
        self.lesions.get(case).and_then(|list| {
            list.iter()
                .position(|l| l.canonical_cmp(lesion).is_eq())
                .map(|i| i + 1)
        })
    }

    fn case_lesions(&self, case: &CaseKey) -> &[&'a Lesion] {
        self.lesions.get(case).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl Writer for RjafrocWriter {
    fn write(&self, table: &RecordTable) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let ids = IdAssignment::from_table(table);

        let mut tp_rows = Vec::new();
        let mut fp_rows = Vec::new();
        for record in table {
            let reader_id = ids.reader(&record.rater);
            let modality_id = ids.modality(&record.modality);
            let case_id = ids.case(&record.case);
            match (record.label, &record.lesion) {
                (Label::TruePositive, Some(lesion)) => tp_rows.push(TpRow {
                    reader_id,
                    modality_id,
                    case_id,
                    lesion_id: ids.lesion(&record.case, lesion),
                    rating: record.confidence,
                }),
                (Label::FalsePositive, _) => fp_rows.push(FpRow {
                    reader_id,
                    modality_id,
                    case_id,
                    rating: record.confidence,
                }),
                _ => {}
            }
        }
        if tp_rows.is_empty() {
            tp_rows.push(TpRow::default());
        }
        if fp_rows.is_empty() {
            fp_rows.push(FpRow::default());
        }

        let all_readers = ids
            .readers
            .values()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut truth_rows = Vec::new();
        let mut lesion_rows = Vec::new();
        for (case, &case_id) in &ids.cases {
            let modality_id = ids.modality(&case.modality).unwrap_or_default();
            let lesions = ids.case_lesions(case);

            let mut push = |lesion_id: usize, weight: f64, lesion: Option<&Lesion>| {
                truth_rows.push(TruthRow {
                    case_id: Some(case_id),
                    lesion_id: Some(lesion_id),
                    weight: Some(weight),
                    reader_ids: all_readers.clone(),
                    modality_ids: modality_id.to_string(),
                    paradigm: String::new(),
                });
                lesion_rows.push(LesionRow {
                    modality_id,
                    modality: case.modality.clone(),
                    case_id,
                    patient_id: case.patient_id.clone(),
                    study_date: case.study_date.clone(),
                    se_num: case.series.clone(),
                    lesion_id,
                    lesion_name: lesion.map(|l| l.id().to_string()),
                    x: lesion.map(|l| l.center().x),
                    y: lesion.map(|l| l.center().y),
                    z: lesion.map(|l| l.center().z),
                    radius: lesion.map(Lesion::radius),
                });
            };

            if lesions.is_empty() {
                push(0, 0.0, None);
            } else {
                let weight = 1.0 / lesions.len() as f64;
                for (i, lesion) in lesions.iter().enumerate() {
                    push(i + 1, weight, Some(*lesion));
                }
            }
        }

        while truth_rows.len() < 2 {
            truth_rows.push(TruthRow::default());
        }
        truth_rows[0].paradigm = "FROC".to_string();
        truth_rows[1].paradigm = "FCTRL".to_string();

        let rater_rows: Vec<RaterRow> = ids
            .readers
            .iter()
            .map(|(rater, &reader_id)| RaterRow {
                reader_id,
                rater: rater.to_string(),
            })
            .collect();

        write_csv(&self.out_dir.join(TP_FILE), &tp_rows)?;
        write_csv(&self.out_dir.join(FP_FILE), &fp_rows)?;
        write_csv(&self.out_dir.join(TRUTH_FILE), &truth_rows)?;
        write_csv(&self.out_dir.join(SUPPL_LESIONS_FILE), &lesion_rows)?;
        write_csv(&self.out_dir.join(SUPPL_RATERS_FILE), &rater_rows)?;

        info!(
            "Wrote RJafroc tables ({} case(s), {} reader(s)) to {}",
            ids.cases.len(),
            ids.readers.len(),
            self.out_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, Record};
    use crate::types::{Coordinates, Response};
    use std::fs;
    use tempfile::TempDir;

    fn case(series: &str) -> CaseKey {
        CaseKey::new("P001", "20240102", "CT", series)
    }

    fn table() -> RecordTable {
        let c1 = case("1");
        let l1 = Lesion::new("L1", c1.clone(), Coordinates::new(0.0, 0.0, 0.0), 5.0).unwrap();
        let l2 = Lesion::new("L2", c1.clone(), Coordinates::new(50.0, 0.0, 0.0), 5.0).unwrap();
        let hit = Response::new("hit", c1.clone(), Coordinates::new(1.0, 0.0, 0.0), 4.0, None)
            .unwrap();
        let miss = Response::new("miss", c1.clone(), Coordinates::new(20.0, 0.0, 0.0), 2.0, None)
            .unwrap();

        let mut agg = Aggregator::new();
        agg.extend(vec![
            Record::new("rater01", c1.clone(), Some(l1.clone()), Some(hit), Label::TruePositive),
            Record::new("rater01", c1.clone(), Some(l2.clone()), None, Label::FalseNegative),
            Record::new("rater01", c1.clone(), None, Some(miss), Label::FalsePositive),
            Record::new("rater02", c1.clone(), Some(l1), None, Label::FalseNegative),
            Record::new("rater02", c1, Some(l2), None, Label::FalseNegative),
            Record::new("rater02", case("2"), None, None, Label::NoMarks),
        ]);
        agg.finish().table
    }

    fn read(dir: &Path, file: &str) -> Vec<String> {
        fs::read_to_string(dir.join(file))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_write_tables() {
        let tmp = TempDir::new().unwrap();
        RjafrocWriter::new(tmp.path()).write(&table()).unwrap();

        let tp = read(tmp.path(), TP_FILE);
        assert_eq!(tp[0], "ReaderID,ModalityID,CaseID,LesionID,TP_Rating");
        assert_eq!(tp[1..], ["0,0,0,1,4.0"]);

        let fp = read(tmp.path(), FP_FILE);
        assert_eq!(fp[0], "ReaderID,ModalityID,CaseID,FP_Rating");
        assert_eq!(fp[1..], ["0,0,0,2.0"]);

        let truth = read(tmp.path(), TRUTH_FILE);
        assert_eq!(truth[0], "CaseID,LesionID,Weight,ReaderID,ModalityID,Paradigm");
        assert_eq!(
            truth[1..],
            [
                "0,1,0.5,\"0,1\",0,FROC",
                "0,2,0.5,\"0,1\",0,FCTRL",
                "1,0,0.0,\"0,1\",0,"
            ]
        );

        let raters = read(tmp.path(), SUPPL_RATERS_FILE);
        assert_eq!(raters[1..], ["0,rater01", "1,rater02"]);

        let lesions = read(tmp.path(), SUPPL_LESIONS_FILE);
        assert_eq!(lesions.len(), 4);
        assert!(lesions[1].contains("L1"));
    }

    #[test]
    fn test_empty_sheets_have_blank_row() {
        let mut agg = Aggregator::new();
        agg.extend(vec![Record::new("rater01", case("1"), None, None, Label::NoMarks)]);
        let tmp = TempDir::new().unwrap();
        RjafrocWriter::new(tmp.path()).write(&agg.finish().table).unwrap();

        assert_eq!(read(tmp.path(), TP_FILE)[1..], [",,,,"]);
        assert_eq!(read(tmp.path(), FP_FILE)[1..], [",,,"]);
        let truth = read(tmp.path(), TRUTH_FILE);
        assert_eq!(truth[1..], ["0,0,0.0,0,0,FROC", ",,,,,FCTRL"]);
    }
}
