//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "labband",
    version,
    about = "Classify lab results into risk bands and compare reports over time",
    long_about = "Classify extracted lab results into optimal/average/poor bands \
                  against pinned reference ranges, and compare two classified \
                  reports band by band."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow measured values to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Reference data directory (default: $LABBAND_REFERENCE_DIR or the bundled reference/).
    #[arg(long = "reference-dir", value_name = "DIR", global = true)]
    pub reference_dir: Option<PathBuf>,

    /// Result rendering on stdout.
    #[arg(long = "format", value_enum, default_value = "table", global = true)]
    pub format: OutputFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify the extracted documents of one upload.
    Classify(ClassifyArgs),

    /// Compare two classified reports.
    Compare(CompareArgs),

    /// Verify the reference data and print its summary.
    Reference,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Extracted document JSON files; merged in report-date order.
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,

    /// Patient sex (M/F). Defaults to the documents' gender field.
    #[arg(long = "sex", value_name = "SEX")]
    pub sex: Option<String>,

    /// Patient age in years. Defaults to the documents' age or DOB field.
    #[arg(long = "age", value_name = "YEARS")]
    pub age: Option<u32>,

    /// Date of birth (MM/DD/YYYY or YYYY-MM-DD), used when --age is absent.
    #[arg(long = "dob", value_name = "DATE")]
    pub dob: Option<String>,

    /// Date ages are computed against (YYYY-MM-DD, default: today).
    #[arg(long = "today", value_name = "DATE")]
    pub today: Option<String>,

    /// Leave invalid entries out of the per-section view.
    #[arg(long = "no-invalid")]
    pub no_invalid: bool,

    /// List section members absent from the report.
    #[arg(long = "include-missing")]
    pub include_missing: bool,

    /// Also write the classified report as JSON to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CompareArgs {
    /// Classified report JSON of the first collection.
    #[arg(value_name = "REPORT_A")]
    pub report_a: PathBuf,

    /// Classified report JSON of the second collection.
    #[arg(value_name = "REPORT_B")]
    pub report_b: PathBuf,

    /// Collection date of REPORT_A (ISO 8601).
    #[arg(long = "date-a", value_name = "DATE")]
    pub date_a: String,

    /// Collection date of REPORT_B (ISO 8601).
    #[arg(long = "date-b", value_name = "DATE")]
    pub date_b: String,

    /// Comparison settings file (TOML or JSON): weights and watch lists.
    #[arg(long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Also score biomarkers that only the newer report contains.
    #[arg(long = "include-new")]
    pub include_new: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
