//! churnscope: console and dashboard-feed entry point
//!
//! Orchestrates config resolution, loading, segmentation, filtering and
//! report rendering.

use anyhow::{Context, Result};
use churnscope::cli::OutputFormat;
use churnscope::{annotate, load, AnalysisReport, Args};
use clap::Parser;
use std::time::Instant;
use tracing::{debug, info};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.resolve_config()?;
    let filters = args.filter_set()?;
    debug!(?config, ?filters, "resolved settings");

    let start_time = Instant::now();
    let table = load(&config.input, &config.load_options()?)
        .with_context(|| format!("failed to load {}", config.input.display()))?;
    info!(
        customers = table.len(),
        features = table.columns().len(),
        missing_values = table.missing_values(),
        "dataset ready"
    );

    let records = annotate(table.into_records());
    let report = AnalysisReport::build(&records, &filters, config.high_value_threshold);

    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    debug!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "analysis complete"
    );
    Ok(())
}

/// Logs go to stderr so a JSON report on stdout stays machine-readable
fn init_logging(verbose: bool) {
    let default_level = if verbose { "churnscope=debug" } else { "churnscope=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();
}
