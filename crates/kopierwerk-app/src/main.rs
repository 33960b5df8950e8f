// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kopierwerk: policy-compliant PDF redistribution copies.
//
// Entry point. Initialises logging, layers the options file under the
// command line, validates, and runs one copy. Failures are reported as one
// plain-English diagnostic with a category-specific exit code.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use kopierwerk_core::human_errors::humanize_error;
use kopierwerk_core::{KopierwerkError, OptionsValidator, RawOptions};
use kopierwerk_document::{PageAssemblyPipeline, RunReport};
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::info!("Kopierwerk starting");

    match run(&cli) {
        Ok((target, report)) => {
            println!(
                "{} page(s), {} watermark tile(s) written to {}",
                report.pages.len(),
                report.total_tiles(),
                target
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("hint: {}", human.suggestion);
            ExitCode::from(u8::try_from(human.exit_code()).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(String, RunReport), KopierwerkError> {
    let mut raw = cli.raw_options();
    if let Some(path) = &cli.config {
        raw = raw.overlay(load_options_file(path)?);
    }

    let config = OptionsValidator::validate(raw)?;
    let report = PageAssemblyPipeline::new(&config).run()?;
    Ok((config.target.display().to_string(), report))
}

fn load_options_file(path: &Path) -> Result<RawOptions, KopierwerkError> {
    tracing::debug!(path = %path.display(), "Reading options file");
    let json = std::fs::read_to_string(path)?;
    Ok(RawOptions::from_json(&json)?)
}
