// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Parser strategy and format selection
//!
//! `go test` output comes in two shapes: the standard human readable summary
//! and the line-delimited JSON produced by `go test -json` (test2json). Each
//! shape has its own [`Parser`] implementation. The format is always chosen
//! by the caller, never sniffed from the input.

use crate::error::ResultsError;
use crate::event::TestEvent;
use crate::standard::StandardParser;
use crate::test2json::Test2JsonParser;

/// Converts raw `go test` output into test events
pub trait Parser {
    /// Parse a complete output buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the output is structurally invalid for the format.
    fn parse(&self, output: &[u8]) -> Result<Vec<TestEvent>, ResultsError>;
}

impl<P: Parser + ?Sized> Parser for &P {
    fn parse(&self, output: &[u8]) -> Result<Vec<TestEvent>, ResultsError> {
        (**self).parse(output)
    }
}

impl<P: Parser + ?Sized> Parser for Box<P> {
    fn parse(&self, output: &[u8]) -> Result<Vec<TestEvent>, ResultsError> {
        (**self).parse(output)
    }
}

/// Supported `go test` output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Standard `go test` output
    #[default]
    Standard,
    /// `go test -json` / test2json output
    Test2Json,
}

/// Parser selection options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Format of the output to parse
    pub format: OutputFormat,
    /// Emit individual test results alongside package results
    pub include_individual_tests: bool,
}

impl ParserConfig {
    /// Options for the given format with package-level results only
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            include_individual_tests: false,
        }
    }

    /// Request individual test results
    #[must_use]
    pub fn with_individual_tests(mut self, include: bool) -> Self {
        self.include_individual_tests = include;
        self
    }

    /// Check that the options are supported by the format
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::UnsupportedOption` when individual tests are
    /// requested for standard output, which only reports packages.
    pub fn validate(&self) -> Result<(), ResultsError> {
        if self.include_individual_tests && self.format == OutputFormat::Standard {
            return Err(ResultsError::UnsupportedOption {
                message: "individual test results require test2json output".to_string(),
            });
        }
        Ok(())
    }

    /// Build the parser for this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`ParserConfig::validate`].
    pub fn build(&self) -> Result<Box<dyn Parser>, ResultsError> {
        self.validate()?;
        Ok(match self.format {
            OutputFormat::Standard => Box::new(StandardParser::new()),
            OutputFormat::Test2Json => Box::new(
                Test2JsonParser::new().with_individual_tests(self.include_individual_tests),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TestOutcome;
    use similar_asserts::assert_eq;

    #[test]
    fn test_default_config_is_standard_packages_only() {
        let config = ParserConfig::default();
        assert_eq!(config.format, OutputFormat::Standard);
        assert!(!config.include_individual_tests);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_individual_tests_rejected_for_standard() {
        let config = ParserConfig::new(OutputFormat::Standard).with_individual_tests(true);
        let result = config.build();
        assert!(matches!(
            result,
            Err(ResultsError::UnsupportedOption { .. })
        ));
    }

    #[test]
    fn test_individual_tests_allowed_for_test2json() {
        let config = ParserConfig::new(OutputFormat::Test2Json).with_individual_tests(true);
        let parser = config.build().expect("should build");

        let output = br#"{"Action":"pass","Package":"p","Test":"TestA","Elapsed":0.1}
{"Action":"pass","Package":"p","Elapsed":0.2}"#;
        let events = parser.parse(output).expect("should parse");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].test, "TestA");
    }

    #[test]
    fn test_built_standard_parser_parses() {
        let parser = ParserConfig::default().build().expect("should build");
        let events = parser.parse(b"ok  \tpkg/b\t0.250s\n").expect("should parse");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].result, TestOutcome::Pass);
    }
}
