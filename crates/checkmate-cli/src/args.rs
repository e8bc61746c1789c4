use std::path::PathBuf;

use checkmate_core::report::reporter::ReporterKind;
use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "checkmate",
    version,
    about = "Reduce recorded audit rule results into a report"
)]
pub struct Args {
    /// Path to a JSON array of rule results
    pub results_path: PathBuf,

    /// Reporter shaping the output: no-passes or full
    #[arg(long, default_value_t = ReporterKind::NoPasses)]
    pub reporter: ReporterKind,

    /// Location the audit ran against
    #[arg(long, default_value = "about:blank")]
    pub url: String,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Enable verbose (info-level) logging to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Enable debug-level logging to stderr
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
