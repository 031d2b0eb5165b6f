//! Capture the class histogram of a running JVM.
//!
//! Without a command, prints one snapshot sorted by size. With a command
//! after `--`, takes a snapshot, runs the command to completion, takes a
//! second snapshot and prints what changed.
//!
//! # Usage
//!
//! ```bash
//! jhisto_capture --pid 4242 -o before.csv
//! jhisto_capture --pid 4242 -n 20 -- ./load-test.sh --requests 1000
//! jhisto_capture --pid 4242 -f 'com.example.*' --format ndjson -- curl -s localhost:8080/warm
//! ```

use clap::{Parser, ValueEnum};
use jhisto::jhisto_parse::{
    CaptureParser, Criteria, DEFAULT_EXCLUDED_NAMESPACE, MemoryHistogram, ParserConfig,
};
use jhisto::{Histogramer, JcmdConfig, JcmdSource, ReportFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use tracing::Level;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// class,instances,size rows
    Csv,
    /// One JSON record per line
    Ndjson,
}

impl From<Format> for ReportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Csv => ReportFormat::Csv,
            Format::Ndjson => ReportFormat::Ndjson,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "jhisto_capture")]
#[command(about = "Capture and compare class histograms of a running JVM")]
#[command(version)]
struct Args {
    /// Process ID of the target JVM
    #[arg(short, long)]
    pid: u32,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only keep the first N classes
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Select classes: exact name, prefix ending in '*', re:<regex>, type:<binary name>
    #[arg(short, long = "filter")]
    filters: Vec<Criteria>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Path to the jcmd executable
    #[arg(long, default_value = "jcmd")]
    jcmd: String,

    /// Class name prefix to leave out of captures (repeatable)
    #[arg(short = 'x', long = "exclude", default_value = DEFAULT_EXCLUDED_NAMESPACE)]
    excluded: Vec<String>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Command to run between the two snapshots
    #[arg(last = true)]
    command: Vec<String>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = JcmdSource::with_config(
        args.pid,
        JcmdConfig {
            program: args.jcmd,
            ..JcmdConfig::default()
        },
    );
    let parser = CaptureParser::with_config(ParserConfig {
        excluded_namespaces: args.excluded,
    });
    let mut histogramer = Histogramer::with_parser(source, parser);

    let mut histogram = match args.command.split_first() {
        None => {
            eprintln!("Capturing class histogram of pid {}...", args.pid);
            histogramer.snapshot()?.sorted()
        }
        Some((program, program_args)) => {
            eprintln!("Capturing baseline of pid {}...", args.pid);
            let mut status = None;
            let diff = histogramer.diff_around(|| {
                eprintln!("Running: {}", args.command.join(" "));
                status = Some(Command::new(program).args(program_args).status());
                eprintln!("Capturing target of pid {}...", args.pid);
            })?;

            match status {
                Some(Ok(status)) if !status.success() => {
                    eprintln!("Warning: '{}' exited with {}", program, status);
                }
                Some(Err(e)) => {
                    return Err(format!("Failed to run '{}': {}", program, e).into());
                }
                _ => {}
            }
            diff
        }
    };

    if !args.filters.is_empty() {
        histogram = histogram.filter(&args.filters);
    }
    if let Some(n) = args.top {
        histogram = histogram.top(n);
    }

    eprintln!(
        "{} classes, {} instances, {} bytes",
        histogram.len(),
        histogram.total_instances(),
        histogram.total_bytes()
    );

    write_report(&histogram, args.format.into(), args.output)
}

fn write_report(
    histogram: &MemoryHistogram,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            format.write(histogram, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote histogram to {}", path.display());
        }
        None => {
            format.write(histogram, io::stdout().lock())?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
