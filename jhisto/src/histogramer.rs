//! Snapshot orchestration: capture, run some work, capture again, diff.

use crate::source::{JcmdSource, Result, SnapshotSource};
use jhisto_parse::{CaptureParser, MemoryHistogram};
use tracing::info;

/// Takes parsed snapshots from a [`SnapshotSource`].
#[derive(Debug)]
pub struct Histogramer<S> {
    source: S,
    parser: CaptureParser,
}

impl<S: SnapshotSource> Histogramer<S> {
    pub fn new(source: S) -> Self {
        Self::with_parser(source, CaptureParser::new())
    }

    pub fn with_parser(source: S, parser: CaptureParser) -> Self {
        Self { source, parser }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Capture and parse one histogram.
    pub fn snapshot(&mut self) -> Result<MemoryHistogram> {
        let lines = self.source.capture()?;
        let histogram = self.parser.parse_lines(lines)?;
        info!(
            classes = histogram.len(),
            total_bytes = histogram.total_bytes(),
            "took class histogram snapshot"
        );
        Ok(histogram)
    }

    /// Memory retained by `work`: the diff between a snapshot taken after it
    /// ran and one taken before.
    ///
    /// The value returned by `work` is held until the second snapshot has
    /// been taken, so whatever it keeps reachable is still counted.
    pub fn diff_around<T, F>(&mut self, work: F) -> Result<MemoryHistogram>
    where
        F: FnOnce() -> T,
    {
        let reference = self.snapshot()?;
        let retained = work();
        let current = self.snapshot();
        drop(retained);

        Ok(current?.diff(&reference))
    }
}

/// [`Histogramer::diff_around`] against the JVM with the given process ID,
/// using the default `jcmd` configuration.
pub fn diff_around<T, F>(pid: u32, work: F) -> Result<MemoryHistogram>
where
    F: FnOnce() -> T,
{
    Histogramer::new(JcmdSource::new(pid)).diff_around(work)
}
