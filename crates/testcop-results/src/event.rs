// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Test event types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single observed outcome for a package or an individual test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvent {
    /// Package import path
    pub package: String,
    /// Test name, empty for the package-level result
    #[serde(default)]
    pub test: String,
    /// Outcome
    pub result: TestOutcome,
    /// Elapsed time, unset for skips and build failures
    pub duration: Option<Duration>,
    /// Statement coverage as a fraction in `[0, 1]`
    pub coverage: Option<f64>,
}

/// Possible test outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// Package or test passed
    Pass,
    /// Package or test failed, including build failures
    Fail,
    /// Package had no test files or the test was skipped
    Skip,
}

impl TestOutcome {
    /// The lowercase name used in storage and console output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TestEvent {
    /// Create a package-level event with no duration or coverage
    #[must_use]
    pub fn package(package: impl Into<String>, result: TestOutcome) -> Self {
        Self {
            package: package.into(),
            test: String::new(),
            result,
            duration: None,
            coverage: None,
        }
    }

    /// Set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the coverage fraction
    #[must_use]
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Set the individual test name
    #[must_use]
    pub fn with_test(mut self, test: impl Into<String>) -> Self {
        self.test = test.into();
        self
    }

    /// Canonical (package, test) ordering key
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.package, &self.test)
    }

    /// Whether this is the aggregate result of a whole package
    #[must_use]
    pub fn is_package_level(&self) -> bool {
        self.test.is_empty()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.result == TestOutcome::Pass
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.result == TestOutcome::Fail
    }

    #[must_use]
    pub fn skipped(&self) -> bool {
        self.result == TestOutcome::Skip
    }

    /// Human readable duration, `-` when unset
    #[must_use]
    pub fn duration_display(&self) -> String {
        format_duration(self.duration)
    }

    /// Coverage rendered as a percentage, `-` when unset
    ///
    /// The stored value is already a fraction, so it is scaled by 100 once.
    #[must_use]
    pub fn coverage_display(&self) -> String {
        format_coverage(self.coverage)
    }
}

/// Render an optional duration as `488ms` or `2.50s`, `-` when unset
#[must_use]
pub fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        None => "-".to_string(),
        Some(d) if d.as_millis() < 1000 => format!("{}ms", d.as_millis()),
        Some(d) => format!("{:.2}s", d.as_secs_f64()),
    }
}

/// Render an optional coverage fraction as a percentage, `-` when unset
#[must_use]
pub fn format_coverage(coverage: Option<f64>) -> String {
    coverage.map_or_else(|| "-".to_string(), |c| format!("{:.2}%", c * 100.0))
}
