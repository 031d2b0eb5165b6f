//! Reading and writing histogram reports.
//!
//! Two output forms are supported:
//!
//! - CSV: `class,instances,size` followed by one row per entry. Class names
//!   never contain commas, so rows are not quoted.
//! - NDJSON: a header record followed by one `entry` record per class.
//!
//! CSV reports can be read back, so a saved snapshot can be compared against
//! a later capture.

use crate::histogram::CSV_HEADER;
use crate::{HistogramEntry, MemoryHistogram, ReportError, ReportResult};
use std::io::{BufRead, BufReader, Read, Write};

/// Kind of text a tool was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Raw `jcmd GC.class_histogram` output.
    Capture,
    /// A CSV report written by [`MemoryHistogram::write_csv`].
    CsvReport,
}

/// Tell a CSV report apart from a raw capture by its first line.
pub fn detect_input(contents: &str) -> InputKind {
    match contents.lines().next() {
        Some(first) if first.trim() == CSV_HEADER => InputKind::CsvReport,
        _ => InputKind::Capture,
    }
}

impl MemoryHistogram {
    /// Write the CSV report, one line per entry in iteration order.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> ReportResult<()> {
        writeln!(writer, "{CSV_HEADER}")?;
        for entry in self {
            writeln!(writer, "{entry}")?;
        }
        Ok(())
    }

    /// Write the report as NDJSON.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> ReportResult<()> {
        let header = serde_json::json!({
            "type": "header",
            "format": "jhisto",
            "version": "0.1",
            "entries": self.len(),
            "total_instances": self.total_instances(),
            "total_bytes": self.total_bytes()
        });
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;

        for entry in self {
            let mut record = serde_json::to_value(entry)?;
            if let serde_json::Value::Object(ref mut obj) = record {
                obj.insert(
                    "type".to_string(),
                    serde_json::Value::String("entry".to_string()),
                );
            }
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        }

        Ok(())
    }

    /// Read a CSV report back into a histogram.
    pub fn read_csv<R: Read>(reader: R) -> ReportResult<MemoryHistogram> {
        let mut lines = BufReader::new(reader).lines();

        let header = lines.next().transpose()?;
        if header.as_deref().map(str::trim) != Some(CSV_HEADER) {
            return Err(ReportError::MissingHeader);
        }

        let mut histogram = MemoryHistogram::new();
        for (idx, line) in lines.enumerate() {
            let line = line?;
            // Header is line 1.
            let line_num = idx + 2;
            if line.trim().is_empty() {
                continue;
            }

            // Split from the right so only the two numeric fields are cut off.
            let mut fields = line.rsplitn(3, ',');
            let (Some(bytes), Some(instances), Some(class_name)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ReportError::Malformed { line: line_num });
            };
            if class_name.is_empty() {
                return Err(ReportError::Malformed { line: line_num });
            }

            histogram.add(HistogramEntry::new(
                class_name,
                parse_field(instances, "instances", line_num)?,
                parse_field(bytes, "size", line_num)?,
            ));
        }

        Ok(histogram)
    }
}

fn parse_field(value: &str, field: &'static str, line: usize) -> ReportResult<i64> {
    let value = value.trim();
    value
        .parse::<i64>()
        .map_err(|source| ReportError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
            source,
        })
}
