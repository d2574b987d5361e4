//! Configuration for the testcop command line
//!
//! This module provides the clap definitions for every subcommand together
//! with database path resolution, validation and logging options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use testcop_results::OutputFormat;

use crate::storer::StorerKind;
use crate::store::StoreOptions;

/// testcop - track failing and flaky Go packages across CI runs
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "testcop")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to SQLite database file
    ///
    /// If the file doesn't exist, it will be created and initialized.
    /// Defaults to the platform data directory, e.g.
    /// ~/.local/share/testcop/testcop.db on Linux.
    #[arg(short, long, env = "TESTCOP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so command output on stdout stays clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Skip database initialization/migration check
    ///
    /// Useful when the schema is managed with the migrate command.
    #[arg(long, default_value = "false")]
    pub skip_init: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List packages that failed in a test run
    ///
    /// Example:
    ///   go test ./... > run.txt; testcop failed --src run.txt
    Failed {
        /// Source test output file
        #[arg(short, long)]
        src: PathBuf,

        /// The output is in test2json format (go test -json)
        #[arg(long)]
        test2json: bool,

        /// Print the packages as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List packages that failed in some but not all reruns
    ///
    /// Example:
    ///   testcop flaky -r run1.txt,run2.txt,run3.txt
    Flaky {
        /// Output files of repeated runs (repeatable or comma-separated)
        #[arg(short = 'r', long, required = true, num_args = 1.., value_delimiter = ',')]
        retests: Vec<PathBuf>,

        /// The output is in test2json format (go test -json)
        #[arg(long)]
        test2json: bool,

        /// Print the packages as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Store test results and flaky packages for a run
    Store(StoreArgs),

    /// Run database migrations
    Migrate {
        /// Number of migrations to apply, negative to roll back, 0 for all
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        count: i32,
    },
}

/// Arguments of the `store` subcommand
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Build id of the CI job
    #[arg(short = 'i', long)]
    pub build_id: i64,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = StorerKind::Sqlite)]
    pub storer: StorerKind,

    /// Repository name
    #[arg(short = 'g', long, default_value = "")]
    pub repo: String,

    /// Branch name
    #[arg(short, long, default_value = "master")]
    pub branch: String,

    /// Git sha of the test run
    #[arg(short = 'z', long, default_value = "")]
    pub sha: String,

    /// Test execution command
    #[arg(short = 'c', long = "cmd", default_value = "")]
    pub command: String,

    /// Time of the test run (RFC 3339), defaults to now
    #[arg(short = 'm', long)]
    pub time: Option<String>,

    /// Source test output file
    #[arg(short, long)]
    pub src: Option<PathBuf>,

    /// Output files of reruns used to detect flaky packages
    #[arg(short, long, value_delimiter = ',')]
    pub rerun: Vec<PathBuf>,

    /// The run executed benchmarks
    #[arg(long)]
    pub bench: bool,

    /// The run used -short
    #[arg(long)]
    pub short: bool,

    /// The run used -race
    #[arg(long)]
    pub race: bool,

    /// Build tags enabled for the run (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Name of the team the run belongs to
    #[arg(long, default_value = "")]
    pub team: String,

    /// Job name of the run
    #[arg(long, default_value = "")]
    pub job_name: String,

    /// The output is in test2json format (go test -json)
    #[arg(long)]
    pub test2json: bool,

    /// Store individual test results as well as package results
    ///
    /// Only supported with --test2json.
    #[arg(long)]
    pub include_tests: bool,
}

impl StoreArgs {
    /// Convert into pipeline options
    #[must_use]
    pub fn to_options(&self) -> StoreOptions {
        StoreOptions {
            build_id: self.build_id,
            team: self.team.clone(),
            job_name: self.job_name.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            sha: self.sha.clone(),
            command: self.command.clone(),
            time: self.time.clone(),
            src: self.src.clone(),
            rerun: self.rerun.clone(),
            benchmark: self.bench,
            short: self.short,
            race: self.race,
            tags: self.tags.clone(),
            format: output_format(self.test2json),
            include_tests: self.include_tests,
        }
    }
}

/// Map the `--test2json` flag to an output format
#[must_use]
pub fn output_format(test2json: bool) -> OutputFormat {
    if test2json {
        OutputFormat::Test2Json
    } else {
        OutputFormat::Standard
    }
}

impl Config {
    /// Get the database path, using a default if not specified
    ///
    /// Default location is platform-specific:
    /// - macOS: ~/Library/Application Support/testcop/testcop.db
    /// - Linux: ~/.local/share/testcop/testcop.db
    /// - Windows: %LOCALAPPDATA%\testcop\testcop.db
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("testcop")
                .join("testcop.db")
        })
    }

    /// Whether the selected command opens the SQLite database
    #[must_use]
    pub fn needs_database(&self) -> bool {
        match &self.command {
            Some(Command::Migrate { .. }) => true,
            Some(Command::Store(args)) => args.storer == StorerKind::Sqlite,
            _ => false,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `store --include-tests` is used without `--test2json`
    /// - The database parent directory cannot be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(Command::Store(args)) = &self.command
            && args.include_tests
            && !args.test2json
        {
            return Err(ConfigError::IncludeTestsRequiresTest2Json);
        }

        if self.needs_database() {
            let db_path = self.database_path();
            if let Some(parent) = db_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::DatabaseDirectoryCreateFailed(parent.to_path_buf(), e)
                })?;
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Individual tests can only be read from test2json output
    #[error("--include-tests is only supported with --test2json format")]
    IncludeTestsRequiresTest2Json,

    /// Failed to create database directory
    #[error("Failed to create database directory {0}: {1}")]
    DatabaseDirectoryCreateFailed(PathBuf, std::io::Error),
}
