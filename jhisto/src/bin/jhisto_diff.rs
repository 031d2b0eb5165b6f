//! Compare two JVM class histograms.
//!
//! Each input is either raw `jcmd <pid> GC.class_histogram` output or a CSV
//! report written earlier by `jhisto_capture`. The output lists every class
//! whose footprint changed, largest growth first.
//!
//! # Usage
//!
//! ```bash
//! jhisto_diff before.txt after.txt
//! jhisto_diff before.csv after.txt -f 'com.example.*' -n 20 -o diff.csv
//! jhisto_diff before.txt after.txt --format ndjson -f 're:Cache'
//! ```

use clap::{Parser, ValueEnum};
use jhisto::ReportFormat;
use jhisto::jhisto_parse::{
    CaptureParser, Criteria, DEFAULT_EXCLUDED_NAMESPACE, InputKind, MemoryHistogram, ParserConfig,
    detect_input,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
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
#[command(name = "jhisto_diff")]
#[command(about = "Compare two JVM class histograms")]
#[command(version)]
struct Args {
    /// Baseline histogram (capture or CSV report)
    baseline: PathBuf,

    /// Target histogram (capture or CSV report)
    target: PathBuf,

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

    /// Class name prefix to leave out of captures (repeatable)
    #[arg(short = 'x', long = "exclude", default_value = DEFAULT_EXCLUDED_NAMESPACE)]
    excluded: Vec<String>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn load(
    path: &Path,
    parser: &CaptureParser,
) -> Result<MemoryHistogram, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    let histogram = match detect_input(&contents) {
        InputKind::Capture => parser.parse_lines(contents.lines())?,
        InputKind::CsvReport => MemoryHistogram::read_csv(contents.as_bytes())?,
    };

    eprintln!(
        "  {} classes, {} instances, {} bytes",
        histogram.len(),
        histogram.total_instances(),
        histogram.total_bytes()
    );

    Ok(histogram)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let parser = CaptureParser::with_config(ParserConfig {
        excluded_namespaces: args.excluded,
    });

    eprintln!("Loading baseline: {}", args.baseline.display());
    let baseline = load(&args.baseline, &parser)?;

    eprintln!("Loading target: {}", args.target.display());
    let target = load(&args.target, &parser)?;

    eprintln!("Computing diff...");
    let mut diff = target.diff(&baseline);
    if !args.filters.is_empty() {
        diff = diff.filter(&args.filters);
    }
    if let Some(n) = args.top {
        diff = diff.top(n);
    }

    eprintln!(
        "Found {} changed classes, {} bytes net",
        diff.len(),
        diff.total_bytes()
    );

    let format = ReportFormat::from(args.format);
    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            format.write(&diff, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote diff to {}", path.display());
        }
        None => {
            format.write(&diff, io::stdout().lock())?;
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
