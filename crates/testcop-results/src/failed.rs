// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Failed package extraction

use std::collections::HashSet;
use std::path::Path;

use crate::error::ResultsError;
use crate::event::TestEvent;
use crate::parser::Parser;

/// Distinct failed packages among package-level events, in event order
#[must_use]
pub fn failed_in(events: &[TestEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| e.is_package_level() && e.failed())
        .filter(|e| seen.insert(e.package.as_str()))
        .map(|e| e.package.clone())
        .collect()
}

/// Parse output and return the packages that failed
///
/// # Errors
///
/// Returns any error produced by the parser.
pub fn failed_packages<P: Parser + ?Sized>(
    parser: &P,
    output: &[u8],
) -> Result<Vec<String>, ResultsError> {
    let events = parser.parse(output)?;
    Ok(failed_in(&events))
}

/// Read a file and parse its contents
///
/// # Errors
///
/// Returns `ResultsError::Io` if the file cannot be read, or any parser error.
pub fn parse_file<P: Parser + ?Sized>(
    parser: &P,
    path: impl AsRef<Path>,
) -> Result<Vec<TestEvent>, ResultsError> {
    let content = read_output(path.as_ref())?;
    parser.parse(&content)
}

/// Read a file and return the packages that failed
///
/// # Errors
///
/// Returns `ResultsError::Io` if the file cannot be read, or any parser error.
pub fn failed_packages_file<P: Parser + ?Sized>(
    parser: &P,
    path: impl AsRef<Path>,
) -> Result<Vec<String>, ResultsError> {
    let content = read_output(path.as_ref())?;
    failed_packages(parser, &content)
}

pub(crate) fn read_output(path: &Path) -> Result<Vec<u8>, ResultsError> {
    std::fs::read(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
