//! Core value types for lesion/response matching
//!
//! - [`Coordinates`]: a point in physical (scanner) space
//! - [`CaseKey`]: the (patient, study, modality, series) matching scope
//! - [`Lesion`]: reference lesion approximated by a sphere
//! - [`Response`]: a rater's mark with a confidence rating
//! - [`EvaluationConfig`]: run configuration, including the [`Criteria`] variant

mod case;
mod config;
mod coords;
mod lesion;
mod response;

pub use case::CaseKey;
pub use config::{Criteria, EvaluationConfig};
pub use coords::Coordinates;
pub use lesion::Lesion;
pub use response::Response;
