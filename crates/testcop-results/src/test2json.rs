// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! `go test -json` (test2json) output parsing
//!
//! The output is newline-delimited JSON, one record per action:
//!
//! ```text
//! {"Time":"2022-10-28T09:22:00.84-07:00","Action":"run","Package":"example.com/fail","Test":"TestWillFail"}
//! {"Time":"2022-10-28T09:22:00.85-07:00","Action":"fail","Package":"example.com/fail","Test":"TestWillFail","Elapsed":1.5}
//! {"Time":"2022-10-28T09:22:00.86-07:00","Action":"output","Package":"example.com/fail","Output":"coverage: 50.0% of statements\n"}
//! {"Time":"2022-10-28T09:22:00.87-07:00","Action":"fail","Package":"example.com/fail","Elapsed":0.003}
//! ```
//!
//! Records for the same package and test refine one entry until the whole
//! buffer has been read.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResultsError;
use crate::event::{TestEvent, TestOutcome};
use crate::parser::Parser;

/// Coverage annotation inside an output payload
static COVERAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"coverage:\s+([\d.]+)%").expect("static regex must compile"));

/// Action reported by a test2json record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Test has started running
    Run,
    /// Test printed output
    Output,
    /// Test or package passed
    Pass,
    /// Test or package failed
    Fail,
    /// Test or package was skipped
    Skip,
    /// Any other action (start, pause, cont, bench, ...)
    #[serde(other)]
    Other,
}

/// A single record from `go test -json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Test2JsonRecord {
    /// Time the record was emitted
    pub time: Option<DateTime<FixedOffset>>,
    /// Record action
    pub action: Action,
    /// Package import path
    #[serde(default)]
    pub package: String,
    /// Test name, absent for package-level records
    #[serde(default)]
    pub test: String,
    /// Elapsed seconds, present on pass/fail/skip
    pub elapsed: Option<f64>,
    /// Printed output, present on output records
    pub output: Option<String>,
}

impl Test2JsonRecord {
    /// Elapsed time as a duration, if present and representable
    #[must_use]
    pub fn elapsed_duration(&self) -> Option<Duration> {
        let nanos = (self.elapsed? * 1e9).round();
        if nanos.is_finite() && nanos >= 0.0 && nanos <= u64::MAX as f64 {
            Some(Duration::from_nanos(nanos as u64))
        } else {
            None
        }
    }

    /// Coverage fraction announced in the output payload, if any
    #[must_use]
    pub fn coverage(&self) -> Option<f64> {
        let output = self.output.as_deref()?;
        let caps = COVERAGE_RE.captures(output)?;
        caps[1].parse::<f64>().ok().map(|pct| pct / 100.0)
    }
}

/// Parse a single test2json record found on the given 1-based line
///
/// # Errors
///
/// Returns `ResultsError::Json` carrying `line_number` if the record cannot
/// be decoded.
pub fn parse_record(record: &[u8], line_number: usize) -> Result<Test2JsonRecord, ResultsError> {
    serde_json::from_slice(record).map_err(|source| ResultsError::Json {
        line: line_number,
        source,
    })
}

/// Entry being refined while records are read
#[derive(Debug, Default)]
struct Pending {
    result: Option<TestOutcome>,
    duration: Option<Duration>,
    coverage: Option<f64>,
}

/// Parser for `go test -json` output
#[derive(Debug, Clone, Copy, Default)]
pub struct Test2JsonParser {
    include_individual_tests: bool,
}

impl Test2JsonParser {
    /// Create a parser that reports package-level results only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also report individual test results
    #[must_use]
    pub fn with_individual_tests(mut self, include: bool) -> Self {
        self.include_individual_tests = include;
        self
    }

    /// Whether individual test results are reported
    #[must_use]
    pub fn includes_individual_tests(&self) -> bool {
        self.include_individual_tests
    }
}

impl Parser for Test2JsonParser {
    fn parse(&self, output: &[u8]) -> Result<Vec<TestEvent>, ResultsError> {
        let mut entries: BTreeMap<(String, String), Pending> = BTreeMap::new();

        for (idx, line) in output.split(|b| *b == b'\n').enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }

            let record = parse_record(line, idx + 1)?;

            // Build events and similar records carry no package
            if record.package.is_empty() {
                debug!(
                    line = idx + 1,
                    action = ?record.action,
                    "skipping record without a package"
                );
                continue;
            }

            let outcome = match record.action {
                Action::Pass => Some(TestOutcome::Pass),
                Action::Fail => Some(TestOutcome::Fail),
                Action::Skip => Some(TestOutcome::Skip),
                Action::Output | Action::Run | Action::Other => None,
            };

            match (record.action, outcome) {
                (_, Some(result)) => {
                    let entry = entries
                        .entry((record.package.clone(), record.test.clone()))
                        .or_default();
                    entry.result = Some(result);
                    if let Some(duration) = record.elapsed_duration() {
                        entry.duration = Some(duration);
                    }
                }
                (Action::Output, None) => {
                    if let Some(coverage) = record.coverage() {
                        entries
                            .entry((record.package, record.test))
                            .or_default()
                            .coverage = Some(coverage);
                    }
                }
                _ => {}
            }
        }

        let events = entries
            .into_iter()
            .filter(|((_, test), _)| self.include_individual_tests || test.is_empty())
            .filter_map(|((package, test), pending)| {
                let Some(result) = pending.result else {
                    debug!(%package, %test, "dropping entry without a final result");
                    return None;
                };
                let duration = if result == TestOutcome::Skip {
                    None
                } else {
                    pending.duration
                };
                Some(TestEvent {
                    package,
                    test,
                    result,
                    duration,
                    coverage: pending.coverage,
                })
            })
            .collect();

        Ok(events)
    }
}
