//! fragdupe - near-duplicate content fragment detector
//!
//! Splits documentation files into fragments with a format-aware parser,
//! fingerprints each fragment as a set of word shingles and groups
//! fragments whose Jaccard similarity reaches a threshold.
//!
//! The library entry point is [`report::index_and_find`]; the binary is a
//! thin wrapper around [`run_app`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod logging;
pub mod options;
pub mod output;
pub mod parsing;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{JsonOutput, OutputFormat, TextOutput};
use crate::progress::Progress;
use crate::report::{index_and_find, RunControl};

/// Run the command line application.
///
/// The report goes to stdout, logs and progress to stderr.
///
/// # Errors
///
/// Returns an error for invalid options, an unreadable root, an
/// interrupted run or a failed write to stdout.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref());
    let format = cli.format(&config);
    let options = cli.options(config);
    options.validate().context("Invalid options")?;

    log::info!(
        "Scanning {} with the {} parser",
        options.root.display(),
        options.parser
    );

    let handler = signal::install_handler();
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
    let progress = Arc::new(Progress::new(!show_progress));
    let control = RunControl::default()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let report = index_and_find(&options, &control)
        .with_context(|| format!("Duplicate detection failed for {}", options.root.display()))?;
    let exit_code = ExitCode::from_report(&report);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => JsonOutput::new(&report, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write JSON report")?,
        OutputFormat::Text => TextOutput::new(&report, options.verbose)
            .write_to(&mut out)
            .context("Failed to write report")?,
    }
    out.flush().context("Failed to flush stdout")?;

    log::info!(
        "Found {} duplicate groups ({} fragments) in {:.2?}",
        report.groups.len(),
        report.duplicated_segments(),
        report.total_duration()
    );

    Ok(exit_code)
}
