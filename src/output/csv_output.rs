//! CSV record sink
//!
//! Five columns in fixed order: Name, Website, Phone, Categories, Region.
//! Categories are joined with [`CATEGORY_DELIMITER`](crate::record::CATEGORY_DELIMITER).

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::Record;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column headers, in output order
pub const CSV_HEADERS: [&str; 5] = ["Name", "Website", "Phone", "Categories", "Region"];

/// Record sink writing CSV rows to any writer
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Creates (or truncates) the file at `path` and writes the header row
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps a writer and writes the header row
    pub fn new(inner: W) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADERS)?;
        Ok(Self { writer })
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        self.writer.write_record([
            record.name.as_str(),
            record.website.as_str(),
            record.phone.as_str(),
            record.joined_categories().as_str(),
            record.region.as_str(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
