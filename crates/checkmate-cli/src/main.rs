use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use checkmate_core::audit::AuditContext;
use checkmate_core::report::render;
use checkmate_core::report_file;

mod args;

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_logging(args.verbose, args.debug);

    let context = AuditContext::new(args.url.clone());
    let report = report_file(&args.results_path, args.reporter, &context)?;
    info!(
        reporter = %args.reporter,
        violations = report.violation_count(),
        "report ready"
    );

    let output = match args.format {
        args::OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        args::OutputFormat::Text => render::render_text(&report),
    };

    match args.out {
        Some(path) => std::fs::write(&path, &output)
            .with_context(|| format!("failed to write report: {}", path.display()))?,
        None => print!("{output}"),
    }

    std::process::exit(report.exit_code());
}

/// Initialize tracing based on CLI flags. `RUST_LOG` takes precedence.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
