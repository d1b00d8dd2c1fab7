//! Writing the hours-in-CBL table
//!
//! Columns: `dateUTC`, `24hr-UCVF`, `transit_time_limit`. Floats use the
//! shortest representation that round-trips, so rerunning on the same
//! inputs reproduces the file byte for byte.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::core_types::HoursInCblRecord;
use crate::error::{CblError, Result};

/// Column names of the output table
pub const OUTPUT_HEADER: [&str; 3] = ["dateUTC", "24hr-UCVF", "transit_time_limit"];

/// Streams records into a CSV table
pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: csv::Writer::from_writer(writer),
            written: 0,
        }
    }

    /// Append one row; the header goes out with the first row
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    pub fn write(&mut self, record: &HoursInCblRecord) -> Result<()> {
        self.inner.serialize(record.to_row())?;
        self.written += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer. An empty table still gets
    /// its header.
    ///
    /// # Errors
    /// Returns an error if the final write or flush fails.
    pub fn finish(mut self) -> Result<W> {
        if self.written == 0 {
            self.inner.write_record(OUTPUT_HEADER)?;
        }
        self.inner
            .into_inner()
            .map_err(|e| CblError::from(csv::Error::from(e.into_error())))
    }
}

/// Write records, header first, to any writer
///
/// # Errors
/// Returns an error if serialization or the underlying write fails.
pub fn write_records<W: Write>(records: &[HoursInCblRecord], writer: W) -> Result<()> {
    let mut writer = RecordWriter::new(writer);
    for record in records {
        writer.write(record)?;
    }
    writer.finish()?;
    Ok(())
}

/// Write records to a file, replacing it
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_records_to_path(records: &[HoursInCblRecord], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| CblError::io(path, e))?;
    write_records(records, file)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
