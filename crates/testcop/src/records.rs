// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Stored run and result records
//!
//! A [`TestRun`] carries the metadata of one CI invocation of `go test`; every
//! [`TestResultRecord`] points back at its run through `run_id` and shares the
//! run's `created` timestamp.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use testcop_results::{TestEvent, TestOutcome};
use uuid::Uuid;

/// Metadata for one test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub team: String,
    pub job_name: String,
    pub repo: String,
    pub branch: String,
    pub sha: String,
    /// CI build number, used to look the run up again
    pub build_id: i64,
    /// The command that produced the output
    pub command: String,
    pub benchmark: bool,
    pub short: bool,
    pub race: bool,
    /// Build tags enabled for the run
    pub tags: Vec<String>,
    pub duration: Option<Duration>,
}

impl TestRun {
    /// Create a run with a fresh id and empty metadata
    #[must_use]
    pub fn new(build_id: i64, created: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created,
            team: String::new(),
            job_name: String::new(),
            repo: String::new(),
            branch: String::new(),
            sha: String::new(),
            build_id,
            command: String::new(),
            benchmark: false,
            short: false,
            race: false,
            tags: Vec::new(),
            duration: None,
        }
    }

    /// Tags sorted and joined by single spaces, the stored form
    #[must_use]
    pub fn tags_column(&self) -> String {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags.join(" ")
    }

    /// Split a stored tags column back into tags
    #[must_use]
    pub fn parse_tags(column: &str) -> Vec<String> {
        column.split_whitespace().map(str::to_string).collect()
    }

    /// Flags the run was executed with, e.g. `["bench", "race"]`
    #[must_use]
    pub fn flags(&self) -> Vec<&'static str> {
        [
            (self.benchmark, "bench"),
            (self.short, "short"),
            (self.race, "race"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

/// Stored result of a package or test
///
/// `Flaky` only appears on package rows produced by rerun analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordResult {
    Pass,
    Fail,
    Skip,
    Flaky,
}

impl RecordResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Flaky => "flaky",
        }
    }
}

impl From<TestOutcome> for RecordResult {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Pass => Self::Pass,
            TestOutcome::Fail => Self::Fail,
            TestOutcome::Skip => Self::Skip,
        }
    }
}

impl std::fmt::Display for RecordResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored result column holds an unknown value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown test result: {0}")]
pub struct UnknownResult(pub String);

impl FromStr for RecordResult {
    type Err = UnknownResult;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            "flaky" => Ok(Self::Flaky),
            other => Err(UnknownResult(other.to_string())),
        }
    }
}

/// One stored result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRecord {
    pub run_id: Uuid,
    pub created: DateTime<Utc>,
    pub package: String,
    /// Empty for package-level rows
    pub test: String,
    pub result: RecordResult,
    pub duration: Option<Duration>,
    /// Coverage fraction in `[0, 1]`
    pub coverage: Option<f64>,
}

impl TestResultRecord {
    /// Stamp a parsed event with its run
    #[must_use]
    pub fn from_event(run: &TestRun, event: TestEvent) -> Self {
        Self {
            run_id: run.id,
            created: run.created,
            package: event.package,
            test: event.test,
            result: event.result.into(),
            duration: event.duration,
            coverage: event.coverage,
        }
    }

    /// Package-level row marking a package as flaky
    #[must_use]
    pub fn flaky(run: &TestRun, package: impl Into<String>) -> Self {
        Self {
            run_id: run.id,
            created: run.created,
            package: package.into(),
            test: String::new(),
            result: RecordResult::Flaky,
            duration: None,
            coverage: None,
        }
    }

    /// Canonical `package:test` key
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.package, self.test)
    }

    #[must_use]
    pub fn is_package_level(&self) -> bool {
        self.test.is_empty()
    }
}
