//! Lesion/response matching for FROC reader studies
//!
//! Reference lesions and rater responses are reduced to spheres and points
//! in physical coordinates, matched one-to-one per case, and written as
//! TP/FP/FN tables.
//!
//! # Example
//!
//! ```
//! use lesionmatch_core::matching::{classifier_for, Classifier};
//! use lesionmatch_core::{CaseKey, Coordinates, Criteria, Lesion, Response};
//!
//! let case = CaseKey::new("P001", "20240102", "CT", "3");
//! let lesion = Lesion::new("L1", case.clone(), Coordinates::new(0.0, 0.0, 0.0), 5.0).unwrap();
//! let response = Response::new(
//!     "nodule 4",
//!     case.clone(),
//!     Coordinates::new(1.0, 1.0, 0.0),
//!     4.0,
//!     None,
//! )
//! .unwrap();
//!
//! let classifier = classifier_for(Criteria::WithinLesion);
//! let result = classifier.classify(&case, &[lesion], &[response]).unwrap();
//! assert_eq!(result.true_positive_count(), 1);
//! assert_eq!(result.false_positive_count(), 0);
//! ```

pub mod aggregator;
pub mod api;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod geometry;
pub mod layout;
pub mod loader;
pub mod matching;
pub mod rater;
pub mod types;
pub mod writer;

pub use aggregator::{Aggregation, Aggregator, FlatRow, Label, Record, RecordTable};
pub use api::{evaluate, evaluate_dir, evaluate_with_progress};
pub use cli::report::TextReport;
pub use error::{CompletenessIssue, LesionMatchError, Result};
pub use layout::{prepare, ExperimentLayout};
pub use loader::{JsonLoader, Loader};
pub use matching::{Classifier, MatchResult, WithinLesionClassifier};
pub use rater::{CaseInput, Rater};
pub use types::*;
pub use writer::{JsonWriter, RjafrocWriter, Writer};
