// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! testcop-results: `go test` output processing for testcop
//!
//! This library crate parses `go test` output, either the standard human
//! readable summary or `go test -json` records, into [`TestEvent`]s, and
//! reduces them to failed and flaky package lists.
//!
//! # Example
//!
//! ```no_run
//! use testcop_results::{StandardParser, failed_packages, flaky_packages};
//!
//! let parser = StandardParser::new();
//! let run = b"FAIL\texample.com/a\t0.488s\nok  \texample.com/b\t0.250s\n";
//! let failed = failed_packages(&parser, run).unwrap();
//! assert_eq!(failed, vec!["example.com/a"]);
//!
//! let rerun = b"ok  \texample.com/a\t0.301s\nok  \texample.com/b\t0.250s\n";
//! let flaky = flaky_packages(&parser, &[&run[..], &rerun[..]]).unwrap();
//! assert_eq!(flaky, vec!["example.com/a"]);
//! ```

pub mod error;
pub mod event;
pub mod failed;
pub mod flaky;
pub mod parser;
pub mod standard;
pub mod test2json;

pub use error::ResultsError;
pub use event::{TestEvent, TestOutcome, format_coverage, format_duration};
pub use failed::{failed_packages, failed_packages_file, parse_file};
pub use flaky::{FlakyReport, flaky_packages, flaky_packages_files};
pub use parser::{OutputFormat, Parser, ParserConfig};
pub use standard::StandardParser;
pub use test2json::Test2JsonParser;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::ResultsError;
    pub use crate::event::{TestEvent, TestOutcome};
    pub use crate::failed::failed_packages;
    pub use crate::flaky::flaky_packages;
    pub use crate::parser::{OutputFormat, Parser, ParserConfig};
}
