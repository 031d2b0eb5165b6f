//! Where histogram captures come from.
//!
//! A [`SnapshotSource`] returns the raw lines of one class histogram. The
//! [`JcmdSource`] asks a running JVM through `jcmd`; the [`ScriptedSource`]
//! replays captures recorded earlier.

use jhisto_parse::ParseError;
use std::collections::VecDeque;
use std::io;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while taking a snapshot.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no recorded captures left")]
    Exhausted,

    #[error("invalid capture: {0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Supplier of raw histogram captures.
pub trait SnapshotSource {
    /// Take one capture and return its lines in order.
    ///
    /// Blocks until the capture is complete.
    fn capture(&mut self) -> Result<Vec<String>>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &mut S {
    fn capture(&mut self) -> Result<Vec<String>> {
        (**self).capture()
    }
}

/// Configuration for [`JcmdSource`].
#[derive(Debug, Clone)]
pub struct JcmdConfig {
    /// The `jcmd` executable, looked up in `PATH` unless absolute.
    pub program: String,
    /// Diagnostic command to run. `GC.class_histogram` triggers a full GC
    /// first, so only live objects are counted.
    pub command: String,
    /// Extra arguments passed after the diagnostic command.
    pub extra_args: Vec<String>,
}

impl Default for JcmdConfig {
    fn default() -> Self {
        Self {
            program: "jcmd".to_string(),
            command: "GC.class_histogram".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Captures the class histogram of a running JVM with `jcmd`.
#[derive(Debug, Clone)]
pub struct JcmdSource {
    pid: u32,
    config: JcmdConfig,
}

impl JcmdSource {
    pub fn new(pid: u32) -> Self {
        Self::with_config(pid, JcmdConfig::default())
    }

    pub fn with_config(pid: u32, config: JcmdConfig) -> Self {
        Self { pid, config }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl SnapshotSource for JcmdSource {
    fn capture(&mut self) -> Result<Vec<String>> {
        debug!(
            program = %self.config.program,
            pid = self.pid,
            command = %self.config.command,
            "running jcmd"
        );

        // `output()` reads both pipes to the end and waits for the child, so
        // nothing stays open into the next capture.
        let output = Command::new(&self.config.program)
            .arg(self.pid.to_string())
            .arg(&self.config.command)
            .args(&self.config.extra_args)
            .output()
            .map_err(|source| CaptureError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                program: self.config.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(String::from)
            .collect();
        debug!(
            pid = self.pid,
            lines = lines.len(),
            "captured class histogram"
        );

        Ok(lines)
    }
}

/// Replays captures recorded earlier, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    captures: VecDeque<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue each text as one capture.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = Self::new();
        for text in texts {
            source.push_text(text.as_ref());
        }
        source
    }

    pub fn push(&mut self, lines: Vec<String>) {
        self.captures.push_back(lines);
    }

    pub fn push_text(&mut self, text: &str) {
        self.push(text.lines().map(String::from).collect());
    }

    /// Number of captures not yet replayed.
    pub fn remaining(&self) -> usize {
        self.captures.len()
    }
}

impl SnapshotSource for ScriptedSource {
    fn capture(&mut self) -> Result<Vec<String>> {
        self.captures.pop_front().ok_or(CaptureError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_in_order() {
        let mut source = ScriptedSource::from_texts(["first\nline", "second"]);
        assert_eq!(source.remaining(), 2);

        assert_eq!(source.capture().unwrap(), vec!["first", "line"]);
        assert_eq!(source.capture().unwrap(), vec!["second"]);
        assert!(matches!(source.capture(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn borrowed_source_captures() {
        fn capture_once<S: SnapshotSource>(mut source: S) -> Result<Vec<String>> {
            source.capture()
        }

        let mut source = ScriptedSource::from_texts(["only"]);
        assert_eq!(capture_once(&mut source).unwrap(), vec!["only"]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn missing_jcmd_is_spawn_error() {
        let config = JcmdConfig {
            program: "/nonexistent/jhisto-test/jcmd".to_string(),
            ..JcmdConfig::default()
        };
        let mut source = JcmdSource::with_config(1, config);

        match source.capture() {
            Err(CaptureError::Spawn { program, .. }) => {
                assert_eq!(program, "/nonexistent/jhisto-test/jcmd");
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_jcmd_is_command_failed() {
        let config = JcmdConfig {
            program: "false".to_string(),
            ..JcmdConfig::default()
        };
        let mut source = JcmdSource::with_config(1, config);

        match source.capture() {
            Err(CaptureError::CommandFailed { status, .. }) => {
                assert!(!status.success());
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn jcmd_output_is_split_into_lines() {
        let config = JcmdConfig {
            program: "echo".to_string(),
            ..JcmdConfig::default()
        };
        let mut source = JcmdSource::with_config(4242, config);

        assert_eq!(source.capture().unwrap(), vec!["4242 GC.class_histogram"]);
    }

    #[cfg(unix)]
    #[test]
    fn extra_args_follow_command() {
        let config = JcmdConfig {
            program: "echo".to_string(),
            extra_args: vec!["-all".to_string()],
            ..JcmdConfig::default()
        };
        let mut source = JcmdSource::with_config(7, config);

        assert_eq!(
            source.capture().unwrap(),
            vec!["7 GC.class_histogram -all"]
        );
    }

    #[test]
    fn default_config_runs_class_histogram() {
        let source = JcmdSource::new(4242);
        assert_eq!(source.pid(), 4242);
        assert_eq!(source.config.program, "jcmd");
        assert_eq!(source.config.command, "GC.class_histogram");
    }
}
