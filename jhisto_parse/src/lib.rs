//! JVM class histogram parser library.
//!
//! This library turns the text printed by `jcmd <pid> GC.class_histogram`
//! into a [`MemoryHistogram`] and provides the operations used to compare two
//! snapshots: diff, filtering and top-N ranking.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use jhisto_parse::{CaptureParser, Criteria};
//!
//! let parser = CaptureParser::new();
//! let before = parser.parse(File::open("before.txt").unwrap()).unwrap();
//! let after = parser.parse(File::open("after.txt").unwrap()).unwrap();
//!
//! let diff = after.diff(&before);
//! println!("{}", diff.filter(&[Criteria::from("java.util.*")]).top(10));
//! ```

use std::num::ParseIntError;
use thiserror::Error;

pub mod capture;
pub mod class_name;
pub mod criteria;
pub mod entry;
pub mod histogram;
pub mod ordered_map;
pub mod report;

pub use capture::{CaptureParser, ColumnLayout, DEFAULT_EXCLUDED_NAMESPACE, ParserConfig};
pub use criteria::{Criteria, TypeRef};
pub use entry::HistogramEntry;
pub use histogram::MemoryHistogram;
pub use ordered_map::OrderedMap;
pub use report::{InputKind, detect_input};

/// Errors that can occur while parsing a histogram capture.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture has {lines} lines, expected at least 4")]
    TooShort { lines: usize },

    #[error("cannot locate histogram columns on line {line}")]
    ColumnLayout { line: usize },

    #[error("no '--' separator line before the histogram rows")]
    MissingSeparator,

    #[error("row at line {line} is shorter than the histogram columns")]
    TruncatedRow { line: usize },

    #[error("invalid {field} value '{value}' at line {line}: {source}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Result type for capture parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while building filter criteria from text.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("unsupported criteria kind '{0}'")]
    Unsupported(String),

    #[error("empty criteria")]
    Empty,

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors that can occur while reading or writing a histogram report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing 'class,instances,size' header")]
    MissingHeader,

    #[error("malformed report row at line {line}")]
    Malformed { line: usize },

    #[error("invalid {field} value '{value}' at line {line}: {source}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Result type for report reading and writing.
pub type ReportResult<T> = std::result::Result<T, ReportError>;
