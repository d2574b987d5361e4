// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Fuzz target for `go test -json` output parsing
//!
//! Malformed records must surface as errors, never panics.

#![no_main]

use libfuzzer_sys::fuzz_target;

use testcop_results::{Parser, Test2JsonParser};

fuzz_target!(|data: &[u8]| {
    let parser = Test2JsonParser::new().with_individual_tests(true);
    if let Ok(events) = parser.parse(data) {
        let keys: Vec<_> = events.iter().map(|e| e.key()).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "output must be sorted and unique");
    }
});
