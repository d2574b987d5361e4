// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Store pipeline
//!
//! Combines parsed `go test` output and rerun analysis with run metadata and
//! hands the result to a [`Storer`].
//!
//! # Example
//!
//! ```no_run
//! use testcop::db::Database;
//! use testcop::storer::SqliteStorer;
//! use testcop::store::{StoreOptions, StorePipeline};
//!
//! let db = Database::in_memory().expect("create db");
//! db.initialize().expect("init");
//! let mut storer = SqliteStorer::new(db);
//!
//! let options = StoreOptions {
//!     build_id: 42,
//!     src: Some("go-test.out".into()),
//!     ..Default::default()
//! };
//! let stats = StorePipeline::new(options).run(&mut storer).expect("store");
//! println!("Stored {} results", stats.results_inserted);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use testcop_results::{
    FlakyReport, OutputFormat, Parser, ParserConfig, ResultsError, parse_file,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::records::{TestResultRecord, TestRun};
use crate::storer::{Storer, StorerError};

// ============================================================================
// Error Types
// ============================================================================

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Parsing or reading test output failed
    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    /// The storer rejected the run or results
    #[error("Storer error: {0}")]
    Storer(#[from] StorerError),

    /// `--time` is not RFC 3339
    #[error("Invalid run time {value:?}: {source}")]
    InvalidTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

// ============================================================================
// Options and Statistics
// ============================================================================

/// Everything the `store` command needs to know about a run
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub build_id: i64,
    pub team: String,
    pub job_name: String,
    pub repo: String,
    pub branch: String,
    pub sha: String,
    pub command: String,
    /// RFC 3339 time of the run; now when unset
    pub time: Option<String>,
    /// Output of the run itself
    pub src: Option<PathBuf>,
    /// Outputs of reruns used for flaky detection
    pub rerun: Vec<PathBuf>,
    pub benchmark: bool,
    pub short: bool,
    pub race: bool,
    pub tags: Vec<String>,
    pub format: OutputFormat,
    /// Store individual test rows as well as package rows
    pub include_tests: bool,
}

impl StoreOptions {
    /// Parser selection implied by these options
    #[must_use]
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig::new(self.format).with_individual_tests(self.include_tests)
    }

    /// Run creation time
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidTime` if `time` is set but not RFC 3339.
    pub fn created(&self) -> Result<DateTime<Utc>, StoreError> {
        match &self.time {
            None => Ok(Utc::now()),
            Some(value) => DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|source| StoreError::InvalidTime {
                    value: value.clone(),
                    source,
                }),
        }
    }
}

/// Statistics from a store operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Id of the stored run
    pub run_id: uuid::Uuid,
    /// Number of result rows the storer accepted
    pub results_inserted: usize,
    /// Number of packages marked flaky
    pub flaky_packages: usize,
    /// Number of packages that failed in every rerun
    pub consistent_failures: usize,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Builds a run and its results, then stores them
pub struct StorePipeline {
    options: StoreOptions,
}

impl StorePipeline {
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Build the run record from the options, without results
    ///
    /// # Errors
    ///
    /// Returns an error if the run time is invalid.
    pub fn build_run(&self) -> Result<TestRun, StoreError> {
        let o = &self.options;
        let mut run = TestRun::new(o.build_id, o.created()?);
        run.team.clone_from(&o.team);
        run.job_name.clone_from(&o.job_name);
        run.repo.clone_from(&o.repo);
        run.branch.clone_from(&o.branch);
        run.sha.clone_from(&o.sha);
        run.command.clone_from(&o.command);
        run.benchmark = o.benchmark;
        run.short = o.short;
        run.race = o.race;
        run.tags.clone_from(&o.tags);
        Ok(run)
    }

    /// Parse the run output and reruns, then store everything
    ///
    /// Nothing is written unless all input was read and parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are inconsistent, any input cannot be
    /// read or parsed, or the storer fails.
    pub fn run<S: Storer + ?Sized>(&self, storer: &mut S) -> Result<StoreStats, StoreError> {
        // Reject bad option combinations before touching any input
        let parser = self.options.parser_config().build()?;
        let mut run = self.build_run()?;

        let mut records = match &self.options.src {
            Some(src) => self.collect_results(&*parser, src, &mut run)?,
            None => Vec::new(),
        };

        let mut stats = StoreStats {
            run_id: run.id,
            ..Default::default()
        };

        if !self.options.rerun.is_empty() {
            let report = FlakyReport::from_files(&parser, &self.options.rerun)?;
            let flaky = report.flaky();
            stats.flaky_packages = flaky.len();
            stats.consistent_failures = report.consistent().len();
            info!(
                reruns = report.run_count,
                flaky = stats.flaky_packages,
                consistent = stats.consistent_failures,
                "Analyzed reruns"
            );
            records.extend(flaky.into_iter().map(|p| TestResultRecord::flaky(&run, p)));
        }

        stats.results_inserted = storer.insert_run_with_tests(&run, &records)?;

        info!(
            run_id = %run.id,
            build_id = run.build_id,
            results = stats.results_inserted,
            "Stored test run"
        );
        Ok(stats)
    }

    fn collect_results(
        &self,
        parser: &dyn Parser,
        src: &std::path::Path,
        run: &mut TestRun,
    ) -> Result<Vec<TestResultRecord>, StoreError> {
        let events = parse_file(parser, src)?;
        debug!(src = %src.display(), events = events.len(), "Parsed run output");

        // The run took as long as its packages did
        let total: Duration = events
            .iter()
            .filter(|e| e.is_package_level())
            .filter_map(|e| e.duration)
            .sum();
        if !total.is_zero() {
            run.duration = Some(total);
        }

        Ok(events
            .into_iter()
            .map(|event| TestResultRecord::from_event(run, event))
            .collect())
    }
}
