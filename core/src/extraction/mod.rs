pub mod case_key;
pub mod tags;

pub use case_key::extract_case_key;
pub use tags::*;
