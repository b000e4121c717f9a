use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use super::Writer;
use crate::aggregator::RecordTable;
use crate::error::Result;

/// Writes the table rows as a pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonWriter {
    path: PathBuf,
}

impl JsonWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Writer for JsonWriter {
    fn write(&self, table: &RecordTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, &table.rows())?;
        info!("Wrote {} row(s) to {}", table.len(), self.path.display());
        Ok(())
    }
}
