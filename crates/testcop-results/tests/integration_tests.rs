// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Integration tests for testcop-results
//!
//! These tests parse recorded `go test` output in both formats and check that
//! the two formats agree on failed and flaky packages.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use similar_asserts::assert_eq;
use testcop_results::{
    OutputFormat, Parser, ParserConfig, ResultsError, StandardParser, Test2JsonParser, TestEvent,
    TestOutcome, failed_packages, failed_packages_file, flaky_packages, flaky_packages_files,
    parse_file,
};

const SAMPLE: &str = "example.com/sample";

/// Get the fixtures directory for test data
fn fixtures_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    Path::new(&manifest_dir).join("tests/fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

fn sample(pkg: &str) -> String {
    format!("{SAMPLE}/{pkg}")
}

#[test]
fn test_failed_packages_from_standard_file() {
    let got = failed_packages_file(&StandardParser::new(), fixture("run0.txt"))
        .expect("Failed to parse run0.txt");
    assert_eq!(got, vec![sample("fail"), sample("failbuild"), sample("flaky")]);

    let got = failed_packages_file(&StandardParser::new(), fixture("run1.txt"))
        .expect("Failed to parse run1.txt");
    assert_eq!(got, vec![sample("fail"), sample("failbuild")]);
}

#[test]
fn test_failed_packages_agree_across_formats() {
    for run in 0..4 {
        let standard = failed_packages_file(&StandardParser::new(), fixture(&format!("run{run}.txt")))
            .expect("standard parse");
        let json = failed_packages_file(&Test2JsonParser::new(), fixture(&format!("run{run}.json")))
            .expect("test2json parse");

        let standard: BTreeSet<_> = standard.into_iter().collect();
        let json: BTreeSet<_> = json.into_iter().collect();
        assert_eq!(standard, json, "run{run} formats disagree");
    }
}

#[test]
fn test_flaky_packages_from_files() {
    let files: Vec<PathBuf> = (0..4).map(|i| fixture(&format!("run{i}.txt"))).collect();
    let got = flaky_packages_files(&StandardParser::new(), &files).expect("flaky");
    assert_eq!(got, vec![sample("flaky")]);
}

#[test]
fn test_flaky_packages_agree_across_formats() {
    let txt: Vec<PathBuf> = (0..4).map(|i| fixture(&format!("run{i}.txt"))).collect();
    let json: Vec<PathBuf> = (0..4).map(|i| fixture(&format!("run{i}.json"))).collect();

    let standard = flaky_packages_files(&StandardParser::new(), &txt).expect("standard");
    let structured = flaky_packages_files(&Test2JsonParser::new(), &json).expect("test2json");
    assert_eq!(standard, structured);
}

#[test]
fn test_flaky_zero_when_flaky_package_always_passes() {
    let files = [fixture("run1.txt"), fixture("run3.txt")];
    let got = flaky_packages_files(&StandardParser::new(), &files).expect("flaky");
    assert!(got.is_empty(), "got {got:?}");
}

#[test]
fn test_flaky_only_pass() {
    let got = flaky_packages_files(&StandardParser::new(), &[fixture("onlypass.txt")])
        .expect("flaky");
    assert!(got.is_empty());
}

#[test]
fn test_flaky_missing_file_aborts() {
    let files = [fixture("run0.txt"), fixture("does-not-exist.txt")];
    let result = flaky_packages_files(&StandardParser::new(), &files);
    assert!(matches!(result, Err(ResultsError::Io { .. })));
}

#[test]
fn test_scenario_line_oriented() {
    let input = b"FAIL pkg/a 0.488s coverage: 50.0% of statements\nok pkg/b 0.250s\n";

    let failed = failed_packages(&StandardParser::new(), input).expect("failed");
    assert_eq!(failed, vec!["pkg/a"]);

    let parser = ParserConfig::new(OutputFormat::Standard)
        .build()
        .expect("build parser");
    let events = parser.parse(input).expect("parse");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].result, TestOutcome::Fail);
    assert_eq!(events[0].duration, Some(Duration::from_millis(488)));
    assert_eq!(events[1].result, TestOutcome::Pass);
    assert_eq!(events[1].duration, Some(Duration::from_millis(250)));
}

#[test]
fn test_scenario_flakiness() {
    let run1 = "FAIL\tpkg/x\t0.1s\nFAIL\tpkg/y\t0.1s\n";
    let run2 = "ok  \tpkg/x\t0.1s\nFAIL\tpkg/y\t0.1s\n";
    let run3 = "FAIL\tpkg/x\t0.1s\nFAIL\tpkg/y\t0.1s\n";

    let got = flaky_packages(&StandardParser::new(), &[run1, run2, run3]).expect("flaky");
    assert_eq!(got, vec!["pkg/x"]);
}

#[test]
fn test_scenario_structured_package_only() {
    let input = br#"{"Action":"run","Package":"pkg/a","Test":"TestA"}
{"Action":"output","Package":"pkg/a","Test":"TestA","Output":"=== RUN   TestA\n"}
{"Action":"pass","Package":"pkg/a","Test":"TestA","Elapsed":0.01}
{"Action":"pass","Package":"pkg/a","Elapsed":0.02}
{"Action":"run","Package":"pkg/b","Test":"TestB"}
{"Action":"fail","Package":"pkg/b","Test":"TestB","Elapsed":0.01}
{"Action":"output","Package":"pkg/b","Output":"FAIL\n"}
{"Action":"fail","Package":"pkg/b","Elapsed":0.03}
{"Action":"output","Package":"pkg/c","Output":"?   \tpkg/c\t[no test files]\n"}
{"Action":"skip","Package":"pkg/c","Elapsed":0}
"#;
    let events = Test2JsonParser::new().parse(input).expect("parse");
    assert_eq!(
        events,
        vec![
            TestEvent::package("pkg/a", TestOutcome::Pass).with_duration(Duration::from_millis(20)),
            TestEvent::package("pkg/b", TestOutcome::Fail).with_duration(Duration::from_millis(30)),
            TestEvent::package("pkg/c", TestOutcome::Skip),
        ]
    );
}

#[test]
fn test_structured_fixture_is_sorted_and_package_level() {
    let events = parse_file(&Test2JsonParser::new(), fixture("run1.json")).expect("parse");

    assert_eq!(events.len(), 5);
    assert!(events.iter().all(TestEvent::is_package_level));

    let mut keys: Vec<_> = events.iter().map(|e| e.package.clone()).collect();
    let sorted = {
        let mut k = keys.clone();
        k.sort();
        k
    };
    assert_eq!(keys, sorted, "test2json output must be sorted");
    keys.dedup();
    assert_eq!(keys.len(), 5);
}

#[test]
fn test_scenario_build_failure() {
    let events = StandardParser::new()
        .parse(b"FAIL\tpkg/z [build failed]\n")
        .expect("parse");
    assert_eq!(events, vec![TestEvent::package("pkg/z", TestOutcome::Fail)]);
}

#[test]
fn test_skip_events_have_no_duration() {
    for name in ["run0.txt", "run0.json"] {
        let parser = if name.ends_with(".json") {
            ParserConfig::new(OutputFormat::Test2Json)
                .with_individual_tests(true)
                .build()
        } else {
            ParserConfig::new(OutputFormat::Standard).build()
        }
        .expect("build parser");

        let events = parse_file(&parser, fixture(name)).expect("parse");
        let skipped: Vec<_> = events.iter().filter(|e| e.skipped()).collect();
        assert!(!skipped.is_empty(), "{name} should contain a skip");
        assert!(skipped.iter().all(|e| e.duration.is_none()));
    }
}

#[test]
fn test_coverage_is_a_fraction() {
    for name in ["run0.txt", "run0.json"] {
        let parser: Box<dyn Parser> = if name.ends_with(".json") {
            Box::new(Test2JsonParser::new())
        } else {
            Box::new(StandardParser::new())
        };
        let events = parse_file(&parser, fixture(name)).expect("parse");
        let pass = events
            .iter()
            .find(|e| e.package == sample("pass"))
            .expect("pass package present");
        assert_eq!(pass.coverage, Some(0.5), "{name}");
    }
}

#[test]
fn test_repeated_parse_is_deterministic() {
    let content = std::fs::read(fixture("run2.json")).expect("read fixture");
    let parser = Test2JsonParser::new().with_individual_tests(true);
    let first = parser.parse(&content).expect("parse");
    let second = parser.parse(&content).expect("parse");
    assert_eq!(first, second);
}

#[test]
fn test_events_json_serialization() {
    let events = parse_file(&StandardParser::new(), fixture("run0.txt")).expect("parse");
    let json = serde_json::to_string_pretty(&events).expect("Failed to serialize events");

    assert!(json.contains("\"result\": \"fail\""));
    assert!(json.contains("\"result\": \"skip\""));
    assert!(json.contains("\"coverage\": 0.5"));

    let back: Vec<TestEvent> = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(events, back);
}

#[test]
fn test_crlf_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("windows.txt");
    std::fs::write(
        &path,
        "FAIL\tpkg/a\t0.488s\r\nok  \tpkg/b\t0.250s\tcoverage: 12.5% of statements\r\n",
    )
    .expect("write");

    let events = parse_file(&StandardParser::new(), &path).expect("parse");
    assert_eq!(
        events,
        vec![
            TestEvent::package("pkg/a", TestOutcome::Fail).with_duration(Duration::from_millis(488)),
            TestEvent::package("pkg/b", TestOutcome::Pass)
                .with_duration(Duration::from_millis(250))
                .with_coverage(0.125),
        ]
    );
}

#[test]
fn test_no_tests_to_run_agrees_across_formats() {
    let standard = StandardParser::new()
        .parse(b"ok  \texample.com/x\t0.003s [no tests to run]\n")
        .expect("standard parse");
    let json = Test2JsonParser::new()
        .parse(
            br#"{"Action":"output","Package":"example.com/x","Output":"ok  \texample.com/x\t0.003s [no tests to run]\n"}
{"Action":"pass","Package":"example.com/x","Elapsed":0.003}"#,
        )
        .expect("test2json parse");

    let expected = vec![
        TestEvent::package("example.com/x", TestOutcome::Pass).with_duration(Duration::from_millis(3)),
    ];
    assert_eq!(standard, expected);
    assert_eq!(json, expected);
}
