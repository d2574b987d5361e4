// Copyright (c) 2026 - present testcop contributors
// SPDX-License-Identifier: MIT

//! Storage backends for test runs and results
//!
//! The `store` command writes through the [`Storer`] trait. Which backend is
//! used is decided by [`StorerKind`] in the command line configuration.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{Database, DbError};
use crate::records::{TestResultRecord, TestRun};

/// Storer errors
#[derive(Debug, Error)]
pub enum StorerError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Failed to write console output
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot perform this operation
    #[error("{operation} is not supported by the {storer} storer")]
    Unsupported {
        storer: &'static str,
        operation: &'static str,
    },
}

/// A sink for test runs and their results
pub trait Storer {
    /// Record a test run
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be stored.
    fn insert_run(&mut self, run: &TestRun) -> Result<(), StorerError>;

    /// Fetch the most recent run for a build
    ///
    /// # Errors
    ///
    /// Returns an error if the run is missing or the backend cannot read.
    fn get_run(&mut self, build_id: i64) -> Result<TestRun, StorerError>;

    /// Record test results, returning how many were stored
    ///
    /// # Errors
    ///
    /// Returns an error if the results cannot be stored.
    fn insert_tests(&mut self, records: &[TestResultRecord]) -> Result<usize, StorerError>;

    /// Record a run together with its results
    ///
    /// The default inserts the run and then the results, so a failed result
    /// insert leaves the run behind. Backends that support transactions
    /// override this to store both or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the run or any result cannot be stored.
    fn insert_run_with_tests(
        &mut self,
        run: &TestRun,
        records: &[TestResultRecord],
    ) -> Result<usize, StorerError> {
        self.insert_run(run)?;
        self.insert_tests(records)
    }

    /// Fetch the results stored with a run's creation time
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot read.
    fn get_tests(&mut self, created: &DateTime<Utc>)
    -> Result<Vec<TestResultRecord>, StorerError>;
}

impl<S: Storer + ?Sized> Storer for &mut S {
    fn insert_run(&mut self, run: &TestRun) -> Result<(), StorerError> {
        (**self).insert_run(run)
    }

    fn get_run(&mut self, build_id: i64) -> Result<TestRun, StorerError> {
        (**self).get_run(build_id)
    }

    fn insert_tests(&mut self, records: &[TestResultRecord]) -> Result<usize, StorerError> {
        (**self).insert_tests(records)
    }

    fn insert_run_with_tests(
        &mut self,
        run: &TestRun,
        records: &[TestResultRecord],
    ) -> Result<usize, StorerError> {
        (**self).insert_run_with_tests(run, records)
    }

    fn get_tests(
        &mut self,
        created: &DateTime<Utc>,
    ) -> Result<Vec<TestResultRecord>, StorerError> {
        (**self).get_tests(created)
    }
}

/// Available storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StorerKind {
    /// SQLite database at the configured path
    #[default]
    Sqlite,
    /// Render runs and results on stdout
    Stdout,
}

impl std::fmt::Display for StorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Stdout => f.write_str("stdout"),
        }
    }
}

/// SQLite-backed storer
pub struct SqliteStorer {
    db: Database,
}

impl SqliteStorer {
    /// Wrap an already opened database
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database file and bring its schema up to date
    ///
    /// With `skip_init` the schema is left alone, but it must already be
    /// current.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, migrations fail, or
    /// `skip_init` is set on an outdated database.
    pub fn open(path: &Path, skip_init: bool) -> Result<Self, StorerError> {
        let db = Database::open(path)?;
        if skip_init {
            if !db.is_initialized() {
                return Err(DbError::NotInitialized.into());
            }
            debug!("Skipping database initialization");
        } else {
            db.initialize()?;
        }
        info!(path = %path.display(), "Database ready");
        Ok(Self { db })
    }

    /// Get reference to the database
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Storer for SqliteStorer {
    fn insert_run(&mut self, run: &TestRun) -> Result<(), StorerError> {
        Ok(self.db.insert_run(run)?)
    }

    fn get_run(&mut self, build_id: i64) -> Result<TestRun, StorerError> {
        Ok(self.db.get_run(build_id)?)
    }

    fn insert_tests(&mut self, records: &[TestResultRecord]) -> Result<usize, StorerError> {
        Ok(self.db.insert_tests(records)?)
    }

    fn insert_run_with_tests(
        &mut self,
        run: &TestRun,
        records: &[TestResultRecord],
    ) -> Result<usize, StorerError> {
        Ok(self.db.insert_run_with_tests(run, records)?)
    }

    fn get_tests(
        &mut self,
        created: &DateTime<Utc>,
    ) -> Result<Vec<TestResultRecord>, StorerError> {
        Ok(self.db.get_tests(created)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordResult;
    use similar_asserts::assert_eq;

    fn storer() -> SqliteStorer {
        let db = Database::in_memory().expect("create db");
        db.initialize().expect("init");
        SqliteStorer::new(db)
    }

    #[test]
    fn test_sqlite_storer_round_trip() {
        let mut storer = storer();
        let run = TestRun::new(12, Utc::now());
        storer.insert_run(&run).expect("insert run");
        let inserted = storer
            .insert_tests(&[TestResultRecord::flaky(&run, "example.com/x")])
            .expect("insert tests");
        assert_eq!(inserted, 1);

        assert_eq!(storer.get_run(12).expect("get run").id, run.id);
        let tests = storer.get_tests(&run.created).expect("get tests");
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].result, RecordResult::Flaky);
    }

    #[test]
    fn test_sqlite_storer_missing_run() {
        let mut storer = storer();
        let err = storer.get_run(1).expect_err("missing");
        assert!(matches!(
            err,
            StorerError::Database(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_open_skip_init_requires_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fresh.db");

        let err = SqliteStorer::open(&path, true).err().expect("uninitialized");
        assert!(matches!(err, StorerError::Database(DbError::NotInitialized)));

        SqliteStorer::open(&path, false).expect("initializes");
        let storer = SqliteStorer::open(&path, true).expect("already initialized");
        assert!(storer.database().is_initialized());
    }

    #[test]
    fn test_storer_kind_display() {
        assert_eq!(StorerKind::Sqlite.to_string(), "sqlite");
        assert_eq!(StorerKind::Stdout.to_string(), "stdout");
        assert_eq!(StorerKind::default(), StorerKind::Sqlite);
    }
}
