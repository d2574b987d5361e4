// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Fuzz target for standard `go test` output parsing

#![no_main]

use libfuzzer_sys::fuzz_target;

use testcop_results::{Parser, StandardParser};

fuzz_target!(|data: &[u8]| {
    // Standard parsing is best effort and must accept any bytes
    let events = StandardParser::new()
        .parse(data)
        .expect("standard parser never errors");
    for event in events {
        assert!(!event.package.is_empty());
        if event.skipped() {
            assert!(event.duration.is_none());
        }
    }
});
