// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Console storer
//!
//! Renders a run header and a per-package results table instead of storing
//! anything. Useful for eyeballing what `store` would write.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use owo_colors::{OwoColorize, Style};
use testcop_results::{format_coverage, format_duration};

use crate::records::{RecordResult, TestResultRecord, TestRun};
use crate::storer::{Storer, StorerError};

const PACKAGE_RESULTS: &str = "<package results>";
const INDENT: &str = "  ";

#[derive(Debug, Default)]
struct Styles {
    title: Style,
    header: Style,
    package_results: Style,
    pass: Style,
    fail: Style,
    skip: Style,
    flaky: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.title = Style::new().bold();
        self.header = Style::new().bold().underline();
        self.package_results = Style::new().italic().cyan();
        self.pass = Style::new().green();
        self.fail = Style::new().red();
        self.skip = Style::new().yellow();
        self.flaky = Style::new().magenta();
    }

    fn result(&self, result: RecordResult) -> Style {
        match result {
            RecordResult::Pass => self.pass,
            RecordResult::Fail => self.fail,
            RecordResult::Skip => self.skip,
            RecordResult::Flaky => self.flaky,
        }
    }
}

/// Storer that prints runs and results to a writer
pub struct StdoutStorer<W> {
    out: W,
    styles: Styles,
}

impl StdoutStorer<io::Stdout> {
    /// Print to stdout, coloured when stdout is a terminal
    #[must_use]
    pub fn stdout() -> Self {
        let out = io::stdout();
        let colored = out.is_terminal();
        Self::new(out).with_color(colored)
    }
}

impl<W: Write> StdoutStorer<W> {
    /// Print uncoloured output to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            styles: Styles::default(),
        }
    }

    /// Enable or disable ANSI colours
    #[must_use]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.styles = Styles::default();
        if enabled {
            self.styles.colorize();
        }
        self
    }

    /// Consume the storer and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_title(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "{INDENT}{}", title.style(self.styles.title))
    }

    fn write_header(&mut self, headers: &[&str], widths: &[usize]) -> io::Result<()> {
        let cells: Vec<String> = headers
            .iter()
            .zip(widths)
            .map(|(h, w)| format!("{:<w$}", h.style(self.styles.header), w = *w))
            .collect();
        writeln!(self.out, "{INDENT}{}", cells.join("  ").trim_end())
    }
}

fn column_widths<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> [usize; N] {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

impl<W: Write> Storer for StdoutStorer<W> {
    fn insert_run(&mut self, run: &TestRun) -> Result<(), StorerError> {
        const HEADERS: [&str; 4] = ["Job", "Repo", "Duration", "Flags"];

        let row = [
            format!("{}#{}", run.job_name, run.build_id),
            format!("{}@{}", run.repo, run.branch),
            format_duration(run.duration),
            format!("[{}]", run.flags().join(" ")),
        ];
        let widths = column_widths(HEADERS, std::slice::from_ref(&row));

        self.write_title("Test Run")?;
        self.write_header(&HEADERS, &widths)?;
        writeln!(
            self.out,
            "{INDENT}{:<w0$}  {:<w1$}  {:>w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        )?;
        writeln!(self.out)?;
        Ok(())
    }

    fn get_run(&mut self, _build_id: i64) -> Result<TestRun, StorerError> {
        Err(StorerError::Unsupported {
            storer: "stdout",
            operation: "get_run",
        })
    }

    fn insert_tests(&mut self, records: &[TestResultRecord]) -> Result<usize, StorerError> {
        const HEADERS: [&str; 5] = ["Package", "Test", "Result", "Duration", "Coverage"];

        // Packages sorted, rows within a package in insertion order
        let mut by_package: BTreeMap<&str, Vec<&TestResultRecord>> = BTreeMap::new();
        for record in records {
            by_package.entry(&record.package).or_default().push(record);
        }

        let groups: Vec<Vec<(RecordResult, [String; 5])>> = by_package
            .iter()
            .map(|(package, rows)| {
                rows.iter()
                    .enumerate()
                    .map(|(idx, r)| {
                        let package = if idx == 0 { *package } else { "" };
                        let test = if r.is_package_level() {
                            PACKAGE_RESULTS
                        } else {
                            r.test.as_str()
                        };
                        let cells = [
                            package.to_string(),
                            test.to_string(),
                            r.result.to_string(),
                            format_duration(r.duration),
                            format_coverage(r.coverage),
                        ];
                        (r.result, cells)
                    })
                    .collect()
            })
            .collect();

        let all_rows: Vec<[String; 5]> = groups
            .iter()
            .flatten()
            .map(|(_, cells)| cells.clone())
            .collect();
        let widths = column_widths(HEADERS, &all_rows);
        let separator = "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1));

        self.write_title("Test Results")?;
        self.write_header(&HEADERS, &widths)?;
        for group in &groups {
            for (result, cells) in group {
                let test_style = if cells[1] == PACKAGE_RESULTS {
                    self.styles.package_results
                } else {
                    Style::new()
                };
                writeln!(
                    self.out,
                    "{INDENT}{:<w0$}  {:<w1$}  {:^w2$}  {:>w3$}  {:>w4$}",
                    cells[0],
                    cells[1].style(test_style),
                    cells[2].style(self.styles.result(*result)),
                    cells[3],
                    cells[4],
                    w0 = widths[0],
                    w1 = widths[1],
                    w2 = widths[2],
                    w3 = widths[3],
                    w4 = widths[4],
                )?;
            }
            writeln!(self.out, "{INDENT}{separator}")?;
        }
        writeln!(self.out)?;

        Ok(records.len())
    }

    fn get_tests(
        &mut self,
        _created: &DateTime<Utc>,
    ) -> Result<Vec<TestResultRecord>, StorerError> {
        Err(StorerError::Unsupported {
            storer: "stdout",
            operation: "get_tests",
        })
    }
}
