//! Database module for testcop
//!
//! This module provides SQLite storage for test runs and their package and
//! test results.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::migrations;
use crate::records::{RecordResult, TestResultRecord, TestRun, UnknownResult};

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] migrations::MigrationError),

    /// Database not initialized
    #[error("Database not initialized")]
    NotInitialized,

    /// Record not found
    #[error("Record not found: {table}/{id}")]
    NotFound { table: String, id: String },

    /// Table is not part of the schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A stored column could not be decoded
    #[error("Invalid {column} value {value:?}: {reason}")]
    InvalidColumn {
        column: &'static str,
        value: String,
        reason: String,
    },
}

/// Tables that [`Database::count`] accepts
const COUNTABLE_TABLES: &[&str] = &["runs", "test_results", "schema_migrations"];

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, DbError> {
        Self::configure(Connection::open_in_memory()?)
    }

    /// Open a database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        debug!(path = %path.display(), "Opening database");
        Self::configure(Connection::open(path)?)
    }

    fn configure(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Initialize the database schema using migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn initialize(&self) -> Result<(), DbError> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    /// Move the schema `count` migrations up (positive) or down (negative)
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub fn migrate_steps(&self, count: i32) -> Result<Vec<i32>, DbError> {
        Ok(migrations::steps(&self.conn, count)?)
    }

    /// Check if the database is initialized and up to date
    pub fn is_initialized(&self) -> bool {
        migrations::is_up_to_date(&self.conn)
    }

    /// Get the current schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, DbError> {
        Ok(migrations::get_version(&self.conn)?)
    }

    /// Get the underlying connection (for advanced queries)
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Count the rows of a schema table
    ///
    /// # Errors
    ///
    /// Returns `DbError::UnknownTable` for names outside the schema, or an
    /// error if the query fails.
    pub fn count(&self, table: &str) -> Result<i64, DbError> {
        let Some(table) = COUNTABLE_TABLES.iter().find(|known| **known == table) else {
            return Err(DbError::UnknownTable(table.to_string()));
        };
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // Runs
    // ========================================================================

    /// Insert a test run
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. the run id already exists.
    pub fn insert_run(&self, run: &TestRun) -> Result<(), DbError> {
        insert_run_row(&self.conn, run)
    }

    /// Get the most recent run stored for a build id
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if no run has this build id.
    pub fn get_run(&self, build_id: i64) -> Result<TestRun, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, created, team, job_name, repo, branch, sha, build_id, command, \
                 benchmark, short, race, tags, duration_ms \
                 FROM runs WHERE build_id = ?1 ORDER BY created DESC LIMIT 1",
                [build_id],
                RunRow::from_row,
            )
            .optional()?;

        row.ok_or_else(|| DbError::NotFound {
            table: "runs".to_string(),
            id: build_id.to_string(),
        })?
        .into_run()
    }

    // ========================================================================
    // Test results
    // ========================================================================

    /// Insert test results in a single transaction
    ///
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; no rows are kept in that case.
    pub fn insert_tests(&mut self, records: &[TestResultRecord]) -> Result<usize, DbError> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        insert_result_rows(&tx, records)?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Insert a run and its results in a single transaction
    ///
    /// Returns the number of result rows inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; neither the run nor its results
    /// are kept in that case.
    pub fn insert_run_with_tests(
        &mut self,
        run: &TestRun,
        records: &[TestResultRecord],
    ) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        insert_run_row(&tx, run)?;
        insert_result_rows(&tx, records)?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Get every result stored with the given creation time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn get_tests(&self, created: &DateTime<Utc>) -> Result<Vec<TestResultRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, created, package, test, result, duration_ms, coverage \
             FROM test_results WHERE created = ?1 ORDER BY package, test, id",
        )?;
        let rows = stmt
            .query_map([timestamp(created)], ResultRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ResultRow::into_record).collect()
    }
}

/// Fixed-width RFC 3339 so stored timestamps compare as text
fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn insert_run_row(conn: &Connection, run: &TestRun) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO runs (id, created, team, job_name, repo, branch, sha, build_id, \
         command, benchmark, short, race, tags, duration_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            run.id.to_string(),
            timestamp(&run.created),
            run.team,
            run.job_name,
            run.repo,
            run.branch,
            run.sha,
            run.build_id,
            run.command,
            run.benchmark,
            run.short,
            run.race,
            run.tags_column(),
            run.duration.map(millis),
        ],
    )?;
    debug!(id = %run.id, build_id = run.build_id, "Inserted run");
    Ok(())
}

fn insert_result_rows(conn: &Connection, records: &[TestResultRecord]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO test_results (run_id, created, package, test, result, duration_ms, coverage) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for record in records {
        stmt.execute(params![
            record.run_id.to_string(),
            timestamp(&record.created),
            record.package,
            record.test,
            record.result.as_str(),
            record.duration.map(millis),
            record.coverage,
        ])?;
    }
    debug!(count = records.len(), "Inserted test results");
    Ok(())
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn parse_timestamp(column: &'static str, value: String) -> Result<DateTime<Utc>, DbError> {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(time) => Ok(time.with_timezone(&Utc)),
        Err(e) => Err(DbError::InvalidColumn {
            column,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_uuid(column: &'static str, value: String) -> Result<Uuid, DbError> {
    match Uuid::parse_str(&value) {
        Ok(id) => Ok(id),
        Err(e) => Err(DbError::InvalidColumn {
            column,
            reason: e.to_string(),
            value,
        }),
    }
}

fn duration_from_millis(ms: Option<i64>) -> Option<Duration> {
    ms.and_then(|ms| u64::try_from(ms).ok())
        .map(Duration::from_millis)
}

/// Raw `runs` row before decoding
struct RunRow {
    id: String,
    created: String,
    team: String,
    job_name: String,
    repo: String,
    branch: String,
    sha: String,
    build_id: i64,
    command: String,
    benchmark: bool,
    short: bool,
    race: bool,
    tags: String,
    duration_ms: Option<i64>,
}

impl RunRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created: row.get(1)?,
            team: row.get(2)?,
            job_name: row.get(3)?,
            repo: row.get(4)?,
            branch: row.get(5)?,
            sha: row.get(6)?,
            build_id: row.get(7)?,
            command: row.get(8)?,
            benchmark: row.get(9)?,
            short: row.get(10)?,
            race: row.get(11)?,
            tags: row.get(12)?,
            duration_ms: row.get(13)?,
        })
    }

    fn into_run(self) -> Result<TestRun, DbError> {
        Ok(TestRun {
            id: parse_uuid("runs.id", self.id)?,
            created: parse_timestamp("runs.created", self.created)?,
            team: self.team,
            job_name: self.job_name,
            repo: self.repo,
            branch: self.branch,
            sha: self.sha,
            build_id: self.build_id,
            command: self.command,
            benchmark: self.benchmark,
            short: self.short,
            race: self.race,
            tags: TestRun::parse_tags(&self.tags),
            duration: duration_from_millis(self.duration_ms),
        })
    }
}

/// Raw `test_results` row before decoding
struct ResultRow {
    run_id: String,
    created: String,
    package: String,
    test: String,
    result: String,
    duration_ms: Option<i64>,
    coverage: Option<f64>,
}

impl ResultRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            run_id: row.get(0)?,
            created: row.get(1)?,
            package: row.get(2)?,
            test: row.get(3)?,
            result: row.get(4)?,
            duration_ms: row.get(5)?,
            coverage: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<TestResultRecord, DbError> {
        let result: RecordResult =
            self.result
                .parse()
                .map_err(|UnknownResult(value)| DbError::InvalidColumn {
                    column: "test_results.result",
                    value,
                    reason: "unknown result".to_string(),
                })?;

        Ok(TestResultRecord {
            run_id: parse_uuid("test_results.run_id", self.run_id)?,
            created: parse_timestamp("test_results.created", self.created)?,
            package: self.package,
            test: self.test,
            result,
            duration: duration_from_millis(self.duration_ms),
            coverage: self.coverage,
        })
    }
}
