//! rheofit - batch flow-curve fitting.
//!
//! # Usage
//!
//! ```bash
//! # Fit two exports with the default settings
//! rheofit sample1.txt sample2.txt
//!
//! # Every .txt file in the working directory, Cross model, in parallel
//! rheofit --all --ext txt --model Cross --parallel
//!
//! # Settings from a file, results in ./results
//! rheofit --config rheofit.toml --output-dir results data/*.txt
//! ```

use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use rheofit::{FitSession, Settings};

mod cli;

use cli::Cli;

/// Incident log file inside the output directory.
const INCIDENT_LOG: &str = "log";

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("rheofit: {}", err);
            return ExitCode::from(2);
        }
    };

    if let Err(err) = init_logging(&settings) {
        eprintln!("rheofit: cannot open incident log: {}", err);
    }

    let session = match FitSession::new(settings) {
        Ok(session) => session,
        Err(err) => {
            tracing::error!("{}", err);
            return ExitCode::from(2);
        }
    };

    let files = if !cli.files.is_empty() {
        cli.files.clone()
    } else if session.settings().treat_all {
        match session.discover(std::path::Path::new(".")) {
            Ok(files) => files,
            Err(err) => {
                tracing::error!("cannot list the working directory: {}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Vec::new()
    };

    if files.is_empty() {
        println!(
            "No files selected. Pass files or use --all (extension: {}).",
            session.settings().ext
        );
        return ExitCode::SUCCESS;
    }

    let reports = session.run(&files);
    for report in &reports {
        println!("{}", report);
    }
    let skipped = reports.iter().filter(|r| r.is_skipped()).count();
    tracing::info!(files = reports.len(), skipped, "batch finished");

    ExitCode::SUCCESS
}

/// Console output plus the append-only incident log.
fn init_logging(settings: &Settings) -> std::io::Result<()> {
    let default_level = if settings.debug { "debug" } else { "info" };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rheofit={},incident=warn", default_level)));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let incidents = std::fs::create_dir_all(&settings.output_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(settings.output_dir.join(INCIDENT_LOG))
    });

    match incidents {
        Ok(file) => {
            let incident_layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_filter(Targets::new().with_target("incident", Level::WARN));
            tracing_subscriber::registry()
                .with(console)
                .with(incident_layer)
                .init();
            Ok(())
        }
        Err(err) => {
            tracing_subscriber::registry().with(console).init();
            Err(err)
        }
    }
}
