//! JVM class histogram capture and comparison tools.
//!
//! This crate takes class histograms from running JVMs and compares them, to
//! show how much memory a piece of work left behind.
//!
//! # Modules
//!
//! - [`source`] - Where captures come from (`jcmd`, or recorded text)
//! - [`histogramer`] - Snapshot before and after some work and diff
//!
//! # Example
//!
//! ```no_run
//! use jhisto::histogramer::Histogramer;
//! use jhisto::source::JcmdSource;
//! use jhisto::jhisto_parse::Criteria;
//!
//! let mut histogramer = Histogramer::new(JcmdSource::new(4242));
//! let diff = histogramer
//!     .diff_around(|| {
//!         // Drive the JVM, e.g. send it a batch of requests.
//!     })
//!     .unwrap();
//!
//! println!("{}", diff.filter(&[Criteria::from("com.example.*")]).top(20));
//! ```

use jhisto_parse::{MemoryHistogram, ReportResult};
use std::io::Write;

pub mod histogramer;
pub mod source;

// Re-export jhisto_parse for convenience
pub use jhisto_parse;

pub use histogramer::{Histogramer, diff_around};
pub use source::{CaptureError, JcmdConfig, JcmdSource, ScriptedSource, SnapshotSource};

/// Output form of a histogram report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `class,instances,size` rows.
    #[default]
    Csv,
    /// One JSON record per line.
    Ndjson,
}

impl ReportFormat {
    pub fn write<W: Write>(self, histogram: &MemoryHistogram, writer: W) -> ReportResult<()> {
        match self {
            ReportFormat::Csv => histogram.write_csv(writer),
            ReportFormat::Ndjson => histogram.write_ndjson(writer),
        }
    }
}
