// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Standard `go test` output parsing
//!
//! Only the per-package summary lines are read:
//!
//! ```text
//! ok  	example.com/pkg/pass	0.250s	coverage: 50.0% of statements
//! FAIL	example.com/pkg/fail	0.488s
//! FAIL	example.com/pkg/broken [build failed]
//! ?   	example.com/pkg/empty	[no test files]
//! ```
//!
//! Test failure bodies, build diagnostics and standalone coverage lines in
//! between are skipped.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::error::ResultsError;
use crate::event::{TestEvent, TestOutcome};
use crate::parser::Parser;

/// Package summary line. Groups: outcome, package, duration or status, coverage.
///
/// `[no tests to run]` may follow the duration or the coverage annotation.
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*(FAIL|ok|\?)[ \t]+([\w./\-]+)[ \t]+",
        r"([0-9][0-9.a-zµ]*|\[build failed\]|\[setup failed\]|\[no test files\]|\(cached\))",
        r"(?:[ \t]+\[no tests to run\])?",
        r"(?:[ \t]+coverage:[ \t]+(?:([0-9.]+)%[^\r\n]*|\[no statements\]))?",
        r"[ \t]*\r?$",
    ))
    .expect("static regex must compile")
});

/// One `<number><unit>` segment of a Go duration string
static DURATION_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]*\.?[0-9]+)(ns|us|µs|ms|s|m|h)").expect("static regex must compile")
});

/// Parser for standard (non-JSON) `go test` output
///
/// Standard output only reports packages, so every event is package-level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardParser;

impl StandardParser {
    /// Create a new standard output parser
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for StandardParser {
    fn parse(&self, output: &[u8]) -> Result<Vec<TestEvent>, ResultsError> {
        let text = String::from_utf8_lossy(output);
        let mut events = Vec::new();

        for caps in SUMMARY_RE.captures_iter(&text) {
            let result = match &caps[1] {
                "ok" => TestOutcome::Pass,
                "FAIL" => TestOutcome::Fail,
                _ => TestOutcome::Skip,
            };

            let mut event = TestEvent::package(&caps[2], result);

            // Status markers such as [build failed] simply yield no duration
            if result != TestOutcome::Skip {
                event.duration = parse_go_duration(&caps[3]);
            }

            if let Some(pct) = caps.get(4) {
                event.coverage = pct.as_str().parse::<f64>().ok().map(|p| p / 100.0);
            }

            debug!(package = %event.package, result = %event.result, "parsed package summary");
            events.push(event);
        }

        Ok(events)
    }
}

/// Parse a Go duration string such as `0.488s`, `12ms` or `1m2.5s`
///
/// Returns `None` for anything that is not a well-formed duration.
#[must_use]
pub fn parse_go_duration(token: &str) -> Option<Duration> {
    let mut total: u128 = 0;
    let mut pos = 0;

    for caps in DURATION_PART_RE.captures_iter(token) {
        let whole = caps.get(0)?;
        if whole.start() != pos {
            return None;
        }
        pos = whole.end();

        let unit: u128 = match &caps[2] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return None,
        };

        let number = &caps[1];
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        let int: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        let mut nanos = int.checked_mul(unit)?;

        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().ok()?;
            let scale = 10u128.pow(u32::try_from(digits.len()).ok()?);
            nanos = nanos.checked_add(frac * unit / scale)?;
        }

        total = total.checked_add(nanos)?;
    }

    if pos == 0 || pos != token.len() {
        return None;
    }

    u64::try_from(total).ok().map(Duration::from_nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn parse(input: &str) -> Vec<TestEvent> {
        StandardParser::new()
            .parse(input.as_bytes())
            .expect("standard parse never fails")
    }

    #[test]
    fn test_parse_pass_and_fail() {
        let events = parse(
            "FAIL pkg/a 0.488s coverage: 50.0% of statements\nok pkg/b 0.250s\n",
        );

        assert_eq!(
            events,
            vec![
                TestEvent::package("pkg/a", TestOutcome::Fail)
                    .with_duration(Duration::from_millis(488))
                    .with_coverage(0.5),
                TestEvent::package("pkg/b", TestOutcome::Pass)
                    .with_duration(Duration::from_millis(250)),
            ]
        );
    }

    #[test]
    fn test_parse_skips_failure_bodies() {
        let events = parse(
            r"
				--- FAIL: TestWillFail (0.00s)
					failing_test.go:16: number does equal eleven
				FAIL
				FAIL	github.com/example/sample/fail	0.600s
				--- FAIL: TestMightFail (0.00s)
					flaky_test.go:16: integer is factor of 3
				FAIL
				FAIL	github.com/example/sample/flaky	1.685s
				ok  	github.com/example/sample/pass	1.129s coverage: 50.0% of statements
			",
        );

        assert_eq!(
            events,
            vec![
                TestEvent::package("github.com/example/sample/fail", TestOutcome::Fail)
                    .with_duration(Duration::from_millis(600)),
                TestEvent::package("github.com/example/sample/flaky", TestOutcome::Fail)
                    .with_duration(Duration::from_millis(1685)),
                TestEvent::package("github.com/example/sample/pass", TestOutcome::Pass)
                    .with_duration(Duration::from_millis(1129))
                    .with_coverage(0.5),
            ]
        );
    }

    #[test]
    fn test_build_failed_has_no_duration() {
        let events = parse(
            "# example.com/z [example.com/z.test]\n\
             z/z.go:3:1: syntax error: non-declaration statement outside function body\n\
             FAIL\texample.com/z [build failed]\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].package, "example.com/z");
        assert_eq!(events[0].result, TestOutcome::Fail);
        assert_eq!(events[0].duration, None);
    }

    #[test]
    fn test_no_test_files_is_skip_without_duration() {
        let events = parse("?   \texample.com/numbers\t[no test files]\n");
        assert_eq!(events, vec![TestEvent::package("example.com/numbers", TestOutcome::Skip)]);
    }

    #[test]
    fn test_standalone_coverage_line_not_attached() {
        let events = parse(
            "coverage: 76.4% of statements\nok  \texample.com/k8s\t0.721s\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].coverage, None);
        assert_eq!(events[0].duration, Some(Duration::from_millis(721)));
    }

    #[test]
    fn test_no_statements_and_cached() {
        let events = parse(
            "ok  \texample.com/a\t0.002s\tcoverage: [no statements]\n\
             ok  \texample.com/b\t(cached)\n\
             ok  \texample.com/c\t0.003s [no tests to run]\n\
             ok  \texample.com/d\t0.004s\tcoverage: 0.0% of statements [no tests to run]\n",
        );
        assert_eq!(
            events,
            vec![
                TestEvent::package("example.com/a", TestOutcome::Pass)
                    .with_duration(Duration::from_millis(2)),
                TestEvent::package("example.com/b", TestOutcome::Pass),
                TestEvent::package("example.com/c", TestOutcome::Pass)
                    .with_duration(Duration::from_millis(3)),
                TestEvent::package("example.com/d", TestOutcome::Pass)
                    .with_duration(Duration::from_millis(4))
                    .with_coverage(0.0),
            ]
        );
    }

    #[test]
    fn test_package_names_with_punctuation() {
        let events = parse(
            "FAIL\tgithub.com/digital-ocean/fail_build/k8s.io [build failed]\n",
        );
        assert_eq!(events[0].package, "github.com/digital-ocean/fail_build/k8s.io");
    }

    #[test]
    fn test_malformed_duration_is_ignored() {
        let events = parse("ok  \texample.com/a\t0.2.5s\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].result, TestOutcome::Pass);
        assert_eq!(events[0].duration, None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = parse("FAIL\texample.com/a\t0.100s\r\nok  \texample.com/b\t0.200s\r\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].duration, Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_empty_output() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_go_duration() {
        assert_eq!(parse_go_duration("0.488s"), Some(Duration::from_millis(488)));
        assert_eq!(parse_go_duration("12ms"), Some(Duration::from_millis(12)));
        assert_eq!(parse_go_duration("1m2.5s"), Some(Duration::from_millis(62_500)));
        assert_eq!(parse_go_duration("3µs"), Some(Duration::from_micros(3)));
        assert_eq!(parse_go_duration(".5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_go_duration("[build failed]"), None);
        assert_eq!(parse_go_duration("5"), None);
        assert_eq!(parse_go_duration("5s garbage"), None);
        assert_eq!(parse_go_duration(""), None);
    }
}
