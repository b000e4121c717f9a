//! Serializing the canonical record table
//!
//! - [`RjafrocWriter`]: FROC tables (TP, FP, TRUTH) for RJafroc-style analysis
//! - [`JsonWriter`]: the flat row sequence as JSON

mod json;
mod rjafroc;

pub use json::JsonWriter;
pub use rjafroc::RjafrocWriter;

use crate::aggregator::RecordTable;
use crate::error::Result;

/// Persists a record table
pub trait Writer {
    fn write(&self, table: &RecordTable) -> Result<()>;
}
