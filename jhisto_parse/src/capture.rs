//! Parse the text output of `jcmd <pid> GC.class_histogram`.
//!
//! A capture looks like this:
//!
//! ```text
//! 12345:
//!  num     #instances         #bytes  class name (module)
//! -------------------------------------------------------
//!    1:         38281        3186056  [B (java.base@17.0.2)
//!    2:         36571         877704  java.lang.String (java.base@17.0.2)
//! Total         74852        4063760
//! ```
//!
//! The numeric columns are fixed-width and right-aligned. Their boundaries
//! are found once per capture from the 4th line, which is the first data row,
//! and applied to every row after the `--` separator.

use crate::class_name::normalize;
use crate::{HistogramEntry, MemoryHistogram, ParseError, Result};
use std::io::{BufRead, BufReader, Read};
use tracing::debug;

/// Namespace of the in-process agent classes shipped alongside these tools.
pub const DEFAULT_EXCLUDED_NAMESPACE: &str = "io.jhisto.";

/// Zero-based index of the line used for column discovery.
const LAYOUT_LINE: usize = 3;

const SEPARATOR_PREFIX: &str = "--";

/// Configuration for the capture parser.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Rows whose raw class name starts with one of these prefixes are
    /// dropped, so the measuring code never shows up in its own report.
    pub excluded_namespaces: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            excluded_namespaces: vec![DEFAULT_EXCLUDED_NAMESPACE.to_string()],
        }
    }
}

/// Byte offsets of the numeric columns within a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Position of the `:` that ends the rank column.
    pub colon: usize,
    pub instances_end: usize,
    pub bytes_end: usize,
}

/// The three fields of one data row, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawRow<'a> {
    instances: &'a str,
    bytes: &'a str,
    class_name: &'a str,
}

impl ColumnLayout {
    /// Find the column boundaries from a data row such as
    /// `   1:         38281        3186056  [B`.
    ///
    /// Each numeric column ends where a run of spaces followed by a run of
    /// non-spaces ends.
    pub fn locate(line: &str) -> Option<Self> {
        let colon = line.find(':')?;
        let instances_end = end_of_field(line, colon + 1)?;
        let bytes_end = end_of_field(line, instances_end + 1)?;
        Some(Self {
            colon,
            instances_end,
            bytes_end,
        })
    }

    /// Split a row into its fields.
    ///
    /// Rows ranked past 9999 print a wider rank column; their offsets are
    /// shifted by however far their own `:` sits right of the layout's.
    fn split<'a>(&self, line: &'a str) -> Option<RawRow<'a>> {
        let shift = line
            .find(':')
            .filter(|&c| c > self.colon && c < self.instances_end)
            .map_or(0, |c| c - self.colon);

        let instances = line.get(self.colon + 1 + shift..self.instances_end + shift)?;
        let bytes = line.get(self.instances_end + 1 + shift..self.bytes_end + shift)?;
        let class_name = line.get(self.bytes_end + shift..)?;

        Some(RawRow {
            instances: instances.trim(),
            bytes: bytes.trim(),
            class_name: class_name.trim(),
        })
    }
}

fn end_of_field(line: &str, begin: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut it = begin;
    while *bytes.get(it)? == b' ' {
        it += 1;
    }
    while it < bytes.len() && bytes[it] != b' ' {
        it += 1;
    }
    Some(it)
}

/// Parser from capture text to [`MemoryHistogram`].
#[derive(Debug, Clone, Default)]
pub struct CaptureParser {
    config: ParserConfig,
}

impl CaptureParser {
    /// Create a parser that excludes the default agent namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a whole capture from a reader and parse it.
    pub fn parse<R: Read>(&self, reader: R) -> Result<MemoryHistogram> {
        let lines = BufReader::new(reader)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()?;
        self.parse_lines(lines)
    }

    /// Parse the lines of one capture.
    ///
    /// Any malformed row fails the whole capture; no partial histogram is
    /// returned.
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<MemoryHistogram>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<S> = lines.into_iter().collect();
        if lines.len() <= LAYOUT_LINE {
            return Err(ParseError::TooShort { lines: lines.len() });
        }

        let Some(layout) = ColumnLayout::locate(lines[LAYOUT_LINE].as_ref()) else {
            return Err(ParseError::ColumnLayout {
                line: LAYOUT_LINE + 1,
            });
        };

        let separator = lines
            .iter()
            .position(|line| line.as_ref().starts_with(SEPARATOR_PREFIX))
            .ok_or(ParseError::MissingSeparator)?;

        let mut histogram = MemoryHistogram::new();
        let mut skipped = 0usize;

        for (idx, line) in lines.iter().enumerate().skip(separator + 1) {
            let line = line.as_ref();
            let line_num = idx + 1;

            if line.trim().is_empty() {
                continue;
            }

            let row = layout
                .split(line)
                .ok_or(ParseError::TruncatedRow { line: line_num })?;

            // The totals row has no class name.
            if row.class_name.is_empty() || self.is_excluded(row.class_name) {
                skipped += 1;
                continue;
            }

            let instances = parse_field(row.instances, "instances", line_num)?;
            let bytes = parse_field(row.bytes, "bytes", line_num)?;
            histogram.add(HistogramEntry::new(
                normalize(row.class_name),
                instances,
                bytes,
            ));
        }

        debug!(
            classes = histogram.len(),
            skipped,
            total_bytes = histogram.total_bytes(),
            "parsed class histogram capture"
        );

        Ok(histogram)
    }

    fn is_excluded(&self, class_name: &str) -> bool {
        self.config
            .excluded_namespaces
            .iter()
            .any(|namespace| class_name.starts_with(namespace.as_str()))
    }
}

fn parse_field(value: &str, field: &'static str, line: usize) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|source| ParseError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE_CAPTURE: &str = "\
12345:
 num     #instances         #bytes  class name (module)
-------------------------------------------------------
   1:         38281        3186056  [B (java.base@17.0.2)
   2:         36571         877704  java.lang.String (java.base@17.0.2)
   3:          4012         513536  [Ljava.lang.Object; (java.base@17.0.2)
   4:             7            168  io.jhisto.agent.Marker
   5:             3             72  java.util.ArrayList (java.base@17.0.2)
   6:             2             64  [[I (java.base@17.0.2)
Total         78875        4577600
";

    fn parse(text: &str) -> Result<MemoryHistogram> {
        CaptureParser::new().parse(Cursor::new(text))
    }

    #[test]
    fn locate_columns_from_data_row() {
        let layout =
            ColumnLayout::locate("   1:         38281        3186056  [B (java.base@17.0.2)")
                .unwrap();

        assert_eq!(layout.colon, 4);
        assert_eq!(layout.instances_end, 19);
        assert_eq!(layout.bytes_end, 34);
    }

    #[test]
    fn locate_without_colon_fails() {
        assert_eq!(ColumnLayout::locate("no colon here"), None);
        assert_eq!(ColumnLayout::locate("   1:    "), None);
    }

    #[test]
    fn parses_rows_in_order() {
        let histogram = parse(SAMPLE_CAPTURE).unwrap();

        let names: Vec<_> = histogram.iter().map(|e| e.class_name()).collect();
        assert_eq!(
            names,
            vec![
                "byte[]",
                "String",
                "Object[]",
                "java.util.ArrayList",
                "int[][]"
            ]
        );

        let string = histogram.get("String").unwrap();
        assert_eq!(string.instances(), 36571);
        assert_eq!(string.bytes(), 877704);
    }

    #[test]
    fn drops_totals_and_agent_rows() {
        let histogram = parse(SAMPLE_CAPTURE).unwrap();

        assert_eq!(histogram.len(), 5);
        assert!(histogram.get("io.jhisto.agent.Marker").is_none());
        assert!(histogram.iter().all(|e| !e.class_name().is_empty()));
    }

    #[test]
    fn custom_excluded_namespace() {
        let config = ParserConfig {
            excluded_namespaces: vec!["java.util.".to_string()],
        };
        let histogram = CaptureParser::with_config(config)
            .parse(Cursor::new(SAMPLE_CAPTURE))
            .unwrap();

        assert!(histogram.get("java.util.ArrayList").is_none());
        assert!(histogram.get("io.jhisto.agent.Marker").is_some());
    }

    #[test]
    fn wide_rank_column_is_realigned() {
        let text = "\
12345:
 num     #instances         #bytes  class name (module)
-------------------------------------------------------
   1:         38281        3186056  [B (java.base@17.0.2)
10000:             1             16  com.example.Rare
Total         38282        3186072
";
        let histogram = parse(text).unwrap();

        let rare = histogram.get("com.example.Rare").unwrap();
        assert_eq!(rare.instances(), 1);
        assert_eq!(rare.bytes(), 16);
    }

    #[test]
    fn accepts_line_iterators() {
        let lines: Vec<String> = SAMPLE_CAPTURE.lines().map(String::from).collect();
        let histogram = CaptureParser::new().parse_lines(&lines).unwrap();
        assert_eq!(histogram.total_bytes(), 3186056 + 877704 + 513536 + 72 + 64);
    }

    #[test]
    fn short_capture_fails() {
        let result = parse("12345:\n num  #instances  #bytes  class name\n");
        assert!(matches!(result, Err(ParseError::TooShort { lines: 2 })));
    }

    #[test]
    fn missing_separator_fails() {
        let text = "\
12345:
 num     #instances         #bytes  class name (module)
=======================================================
   1:         38281        3186056  [B (java.base@17.0.2)
";
        assert!(matches!(parse(text), Err(ParseError::MissingSeparator)));
    }

    #[test]
    fn bad_layout_line_fails() {
        let text = "\
12345:
 num     #instances         #bytes  class name (module)
-------------------------------------------------------
garbage
";
        assert!(matches!(
            parse(text),
            Err(ParseError::ColumnLayout { line: 4 })
        ));
    }

    #[test]
    fn invalid_number_fails_whole_capture() {
        let text = "\
12345:
 num     #instances         #bytes  class name (module)
-------------------------------------------------------
   1:         38281        3186056  [B (java.base@17.0.2)
   2:         3x571         877704  java.lang.String (java.base@17.0.2)
";
        match parse(text) {
            Err(ParseError::InvalidNumber { line, field, value, .. }) => {
                assert_eq!(line, 5);
                assert_eq!(field, "instances");
                assert_eq!(value, "3x571");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn truncated_row_fails() {
        let text = "\
12345:
 num     #instances         #bytes  class name (module)
-------------------------------------------------------
   1:         38281        3186056  [B (java.base@17.0.2)
   2:   36
";
        assert!(matches!(
            parse(text),
            Err(ParseError::TruncatedRow { line: 5 })
        ));
    }
}
