// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Flaky package detection across repeated runs
//!
//! The same test suite is run several times. A package that failed in some
//! runs but not in others is flaky; one that failed in every run is a
//! consistent failure.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResultsError;
use crate::failed::{failed_packages, read_output};
use crate::parser::Parser;

/// Failure tally over a set of runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlakyReport {
    /// Number of runs examined
    pub run_count: usize,
    /// Number of runs each package failed in
    pub fail_counts: BTreeMap<String, usize>,
}

impl FlakyReport {
    /// Parse every run and count the runs each package failed in
    ///
    /// # Errors
    ///
    /// Returns the first parse error; no partial report is produced.
    pub fn from_runs<P, R>(parser: &P, runs: &[R]) -> Result<Self, ResultsError>
    where
        P: Parser + ?Sized,
        R: AsRef<[u8]>,
    {
        let mut report = Self {
            run_count: runs.len(),
            fail_counts: BTreeMap::new(),
        };

        for (idx, run) in runs.iter().enumerate() {
            let failed = failed_packages(parser, run.as_ref())?;
            debug!(run = idx, failed = failed.len(), "tallied run failures");
            for package in failed {
                *report.fail_counts.entry(package).or_insert(0) += 1;
            }
        }

        Ok(report)
    }

    /// Read every run file, then tally failures
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Io` if any file cannot be read, or any parser error.
    pub fn from_files<P, S>(parser: &P, paths: &[S]) -> Result<Self, ResultsError>
    where
        P: Parser + ?Sized,
        S: AsRef<Path>,
    {
        let runs = paths
            .iter()
            .map(|p| read_output(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_runs(parser, &runs)
    }

    /// Packages that failed in at least one run but not in all of them, sorted
    #[must_use]
    pub fn flaky(&self) -> Vec<String> {
        self.fail_counts
            .iter()
            .filter(|&(_, &count)| count > 0 && count < self.run_count)
            .map(|(package, _)| package.clone())
            .collect()
    }

    /// Packages that failed in every run, sorted
    #[must_use]
    pub fn consistent(&self) -> Vec<String> {
        self.fail_counts
            .iter()
            .filter(|&(_, &count)| self.run_count > 0 && count == self.run_count)
            .map(|(package, _)| package.clone())
            .collect()
    }
}

/// Identify flaky packages across several runs of the same suite
///
/// # Errors
///
/// Returns the first parse error encountered.
pub fn flaky_packages<P, R>(parser: &P, runs: &[R]) -> Result<Vec<String>, ResultsError>
where
    P: Parser + ?Sized,
    R: AsRef<[u8]>,
{
    Ok(FlakyReport::from_runs(parser, runs)?.flaky())
}

/// Read every run file, then identify flaky packages
///
/// # Errors
///
/// Returns `ResultsError::Io` if any file cannot be read, or any parser error.
pub fn flaky_packages_files<P, S>(parser: &P, paths: &[S]) -> Result<Vec<String>, ResultsError>
where
    P: Parser + ?Sized,
    S: AsRef<Path>,
{
    Ok(FlakyReport::from_files(parser, paths)?.flaky())
}
