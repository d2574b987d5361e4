// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! testcop: track failing and flaky Go packages across CI runs
//!
//! Reads `go test` output (standard or `-json`), reports failed and flaky
//! packages, and stores results with run metadata in SQLite.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use testcop::commands;
use testcop::config::Config;
use tracing::{debug, error};

fn main() -> ExitCode {
    let config = Config::parse();

    // Logs go to stderr so that stdout only carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(io::stderr)
        .init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    if config.command.is_none() {
        Config::command().print_help()?;
        return Ok(());
    }

    config.validate().context("invalid configuration")?;
    debug!(database = %config.database_path().display(), "Configuration validated");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::execute(config, &mut out)?;
    out.flush()?;
    Ok(())
}
