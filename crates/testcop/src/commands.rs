// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Subcommand implementations
//!
//! Each command writes its user-facing output to the given writer; logs go
//! through `tracing`.

use std::io::Write;
use std::path::Path;

use testcop_results::{FlakyReport, ParserConfig, ResultsError, failed_packages_file};
use thiserror::Error;
use tracing::info;

use crate::config::{Command, Config, StoreArgs, output_format};
use crate::db::{Database, DbError};
use crate::stdout::StdoutStorer;
use crate::store::{StoreError, StorePipeline, StoreStats};
use crate::storer::{SqliteStorer, StorerError, StorerKind};

/// Command errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storer(#[from] StorerError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run the configured subcommand
///
/// # Errors
///
/// Returns the first error raised by the command.
pub fn execute(config: &Config, out: &mut dyn Write) -> Result<(), CommandError> {
    match &config.command {
        None => Ok(()),
        Some(Command::Failed {
            src,
            test2json,
            json,
        }) => failed(src, *test2json, *json, out),
        Some(Command::Flaky {
            retests,
            test2json,
            json,
        }) => flaky(retests, *test2json, *json, out),
        Some(Command::Store(args)) => store(config, args).map(|_| ()),
        Some(Command::Migrate { count }) => migrate(&config.database_path(), *count, out),
    }
}

fn write_packages(packages: &[String], json: bool, out: &mut dyn Write) -> Result<(), CommandError> {
    if json {
        serde_json::to_writer(&mut *out, packages)?;
        writeln!(out)?;
    } else {
        for package in packages {
            writeln!(out, "{package}")?;
        }
    }
    Ok(())
}

/// Print the packages that failed in `src`
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn failed(
    src: &Path,
    test2json: bool,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let parser = ParserConfig::new(output_format(test2json)).build()?;
    let packages = failed_packages_file(&parser, src)?;
    info!(src = %src.display(), failed = packages.len(), "Found failed packages");
    write_packages(&packages, json, out)
}

/// Print the packages that failed in some but not all of `retests`
///
/// # Errors
///
/// Returns an error if any file cannot be read or parsed.
pub fn flaky<S: AsRef<Path>>(
    retests: &[S],
    test2json: bool,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let parser = ParserConfig::new(output_format(test2json)).build()?;
    let report = FlakyReport::from_files(&parser, retests)?;
    let packages = report.flaky();
    info!(
        runs = report.run_count,
        flaky = packages.len(),
        consistent = report.consistent().len(),
        "Classified reruns"
    );
    write_packages(&packages, json, out)
}

/// Store a run with the configured backend
///
/// # Errors
///
/// Returns an error if the storer cannot be opened or the pipeline fails.
pub fn store(config: &Config, args: &StoreArgs) -> Result<StoreStats, CommandError> {
    let pipeline = StorePipeline::new(args.to_options());
    let stats = match args.storer {
        StorerKind::Sqlite => {
            let mut storer = SqliteStorer::open(&config.database_path(), config.skip_init)?;
            pipeline.run(&mut storer)?
        }
        StorerKind::Stdout => pipeline.run(&mut StdoutStorer::stdout())?,
    };
    Ok(stats)
}

/// Apply or roll back migrations on the database file
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub fn migrate(path: &Path, count: i32, out: &mut dyn Write) -> Result<(), CommandError> {
    let db = Database::open(path)?;
    let touched = db.migrate_steps(count)?;
    let version = db.schema_version()?;
    info!(path = %path.display(), migrations = touched.len(), version, "Migrations complete");
    writeln!(out, "schema version {version}")?;
    Ok(())
}
