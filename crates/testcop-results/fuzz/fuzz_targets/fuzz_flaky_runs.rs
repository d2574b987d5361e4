// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Fuzz target for flaky package classification over several runs

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use testcop_results::{FlakyReport, StandardParser};

#[derive(Arbitrary, Debug)]
struct Runs {
    runs: Vec<String>,
}

fuzz_target!(|input: Runs| {
    let report =
        FlakyReport::from_runs(&StandardParser::new(), &input.runs).expect("standard never errors");
    for package in report.flaky() {
        let count = report.fail_counts[&package];
        assert!(count > 0 && count < report.run_count);
    }
});
