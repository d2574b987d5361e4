// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Error types for testcop-results

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while parsing test output
#[derive(Debug, Error)]
pub enum ResultsError {
    /// A test2json record could not be decoded
    #[error("test2json decode error on line {line}: {source}")]
    Json {
        /// 1-based line number of the offending record
        line: usize,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// Error reading a test output file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Parser option not supported by the selected output format
    #[error("unsupported parser option: {message}")]
    UnsupportedOption {
        /// Description of the rejected option
        message: String,
    },
}
