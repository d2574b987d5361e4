//! Database migrations for testcop
//!
//! Each applied migration is recorded in `schema_migrations`, so the schema
//! can be moved forward or back one step at a time.

use rusqlite::{Connection, params};
use thiserror::Error;
use tracing::info;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// SQLite error during migration
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration has no down script
    #[error("Migration {version} cannot be rolled back")]
    Irreversible { version: i32 },
}

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

const BOOKKEEPING: &str = "
    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        applied_at TEXT NOT NULL
    );
";

/// A database migration
pub struct Migration {
    /// Migration version number
    pub version: i32,
    /// Migration name/description
    pub name: &'static str,
    /// SQL to apply the migration
    pub up: &'static str,
    /// SQL to revert the migration (optional)
    pub down: Option<&'static str>,
}

/// All available migrations in order
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_runs",
        up: r"
            CREATE TABLE runs (
                id TEXT PRIMARY KEY,
                created TEXT NOT NULL,
                team TEXT NOT NULL DEFAULT '',
                job_name TEXT NOT NULL DEFAULT '',
                repo TEXT NOT NULL DEFAULT '',
                branch TEXT NOT NULL DEFAULT '',
                sha TEXT NOT NULL DEFAULT '',
                build_id INTEGER NOT NULL,
                command TEXT NOT NULL DEFAULT '',
                benchmark INTEGER NOT NULL DEFAULT 0,
                short INTEGER NOT NULL DEFAULT 0,
                race INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '',
                duration_ms INTEGER
            );
            CREATE INDEX idx_runs_build_id ON runs(build_id);
        ",
        down: Some(
            r"
            DROP INDEX IF EXISTS idx_runs_build_id;
            DROP TABLE IF EXISTS runs;
        ",
        ),
    },
    Migration {
        version: 2,
        name: "create_test_results",
        up: r"
            CREATE TABLE test_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
                created TEXT NOT NULL,
                package TEXT NOT NULL,
                test TEXT NOT NULL DEFAULT '',
                result TEXT NOT NULL CHECK (result IN ('pass', 'fail', 'skip', 'flaky')),
                duration_ms INTEGER,
                coverage REAL
            );
            CREATE INDEX idx_test_results_created ON test_results(created);
            CREATE INDEX idx_test_results_run ON test_results(run_id);
            CREATE INDEX idx_test_results_package ON test_results(package, result);
        ",
        down: Some(
            r"
            DROP INDEX IF EXISTS idx_test_results_package;
            DROP INDEX IF EXISTS idx_test_results_run;
            DROP INDEX IF EXISTS idx_test_results_created;
            DROP TABLE IF EXISTS test_results;
        ",
        ),
    },
];

/// Get the current schema version from the database
///
/// Returns 0 if no migrations have been applied.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_version(conn: &Connection) -> Result<i32, MigrationError> {
    let table_exists: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Apply all pending migrations
///
/// # Errors
///
/// Returns an error if any migration fails.
pub fn migrate(conn: &Connection) -> Result<Vec<i32>, MigrationError> {
    apply_pending(conn, usize::MAX)
}

/// Move the schema by `count` steps
///
/// A positive count applies at most that many pending migrations, a negative
/// count rolls back that many applied ones, and zero applies everything.
/// Returns the versions touched, in the order they were applied or reverted.
///
/// # Errors
///
/// Returns an error if a migration fails or cannot be reverted.
pub fn steps(conn: &Connection, count: i32) -> Result<Vec<i32>, MigrationError> {
    match count {
        0 => migrate(conn),
        n if n > 0 => apply_pending(conn, n.unsigned_abs() as usize),
        n => roll_back(conn, n.unsigned_abs() as usize),
    }
}

fn apply_pending(conn: &Connection, limit: usize) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    let mut applied = Vec::new();

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .take(limit)
    {
        apply_migration(conn, migration)?;
        applied.push(migration.version);
    }

    Ok(applied)
}

fn roll_back(conn: &Connection, limit: usize) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    let mut rolled_back = Vec::new();

    for migration in MIGRATIONS
        .iter()
        .rev()
        .filter(|m| m.version <= current_version)
        .take(limit)
    {
        revert_migration(conn, migration)?;
        rolled_back.push(migration.version);
    }

    Ok(rolled_back)
}

/// Apply a single migration and record it
///
/// # Errors
///
/// Returns an error if the migration fails.
pub fn apply_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(BOOKKEEPING)?;
    tx.execute_batch(migration.up)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    tx.commit()?;

    info!(version = migration.version, name = migration.name, "Applied migration");
    Ok(())
}

/// Revert a single migration and remove its record
///
/// # Errors
///
/// Returns an error if the migration has no down script or the SQL fails.
pub fn revert_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let down = migration.down.ok_or(MigrationError::Irreversible {
        version: migration.version,
    })?;

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(down)?;
    tx.execute(
        "DELETE FROM schema_migrations WHERE version = ?1",
        [migration.version],
    )?;
    tx.commit()?;

    info!(version = migration.version, name = migration.name, "Rolled back migration");
    Ok(())
}

/// Roll back to a specific version
///
/// # Errors
///
/// Returns an error if the rollback fails or if down migrations are not available.
pub fn rollback_to(conn: &Connection, target_version: i32) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    let count = MIGRATIONS
        .iter()
        .filter(|m| m.version > target_version && m.version <= current_version)
        .count();
    roll_back(conn, count)
}

/// Check if the database is up to date
#[must_use]
pub fn is_up_to_date(conn: &Connection) -> bool {
    get_version(conn)
        .map(|v| v >= CURRENT_VERSION)
        .unwrap_or(false)
}
