//! Directory-based SQL migration runner.
//!
//! Migrations are `.sql` files in a directory, ordered by file name
//! (`0000_init.sql`, `0001_...`). Each file's stem is its identifier. They
//! run sequentially, tracked by the `__menuhub_migrations` table. Each
//! migration runs exactly once; if it has already been applied, it is
//! skipped.
//!
//! A migration and its tracking row commit in one transaction, so a failed
//! script leaves no partial schema behind and is retried on the next run.
//! The first failure halts the run; later scripts are not attempted.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Name of the table recording applied migrations.
pub const TRACKING_TABLE: &str = "__menuhub_migrations";

/// Directory holding the migrations that ship with this crate.
pub fn bundled_migrations_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"))
}

/// A single migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Identifier recorded in the tracking table (the file stem).
    pub name: String,
    /// The script text, executed as one batch.
    pub sql: String,
    /// Hex-encoded SHA-256 of `sql`.
    pub checksum: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = hex::encode(Sha256::digest(sql.as_bytes()));
        Self {
            name: name.into(),
            sql,
            checksum,
        }
    }
}

/// A row of the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub name: String,
    pub checksum: String,
    pub applied_at: NaiveDateTime,
}

/// Whether a migration on disk has been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Applied { applied_at: NaiveDateTime },
}

/// A migration on disk and its state in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub state: MigrationState,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migrations applied by this run, in order.
    pub applied: Vec<String>,
    /// Migrations skipped because they were already applied.
    pub skipped: usize,
}

/// Errors that can occur during migration loading or execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migrations directory could not be listed.
    #[error("failed to read migrations directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A migration script could not be read.
    #[error("failed to read migration script {}: {source}", path.display())]
    ReadScript {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A migration file name is not valid UTF-8.
    #[error("migration file name is not valid UTF-8: {}", .0.display())]
    InvalidName(PathBuf),

    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),

    /// An applied migration's script was edited afterwards.
    #[error(
        "migration '{name}' changed after it was applied (recorded checksum {recorded}, found {found})"
    )]
    ChecksumMismatch {
        name: String,
        recorded: String,
        found: String,
    },
}

/// Loads every `.sql` file in `dir`, ordered by file name.
///
/// Other files and subdirectories are ignored. An empty directory yields
/// an empty list.
///
/// # Errors
///
/// Returns `MigrationError::ReadDir` / `ReadScript` on I/O failure and
/// `MigrationError::InvalidName` for non-UTF-8 file names.
pub fn load_migrations(dir: &Path) -> Result<Vec<Migration>, MigrationError> {
    let read_dir_err = |source| MigrationError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut migrations = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| MigrationError::InvalidName(path.clone()))?
            .to_string();
        let sql = std::fs::read_to_string(&path).map_err(|source| MigrationError::ReadScript {
            path: path.clone(),
            source,
        })?;
        migrations.push(Migration::new(name, sql));
    }

    Ok(migrations)
}

/// Runs all pending migrations from `dir` against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `__menuhub_migrations`) are skipped. New migrations are applied in order
/// and recorded.
///
/// # Errors
///
/// Returns `MigrationError` if the directory cannot be read, an applied
/// script was modified, any migration fails to execute, or the tracking
/// table cannot be queried.
pub fn run_migrations(conn: &Connection, dir: &Path) -> Result<MigrationReport, MigrationError> {
    let migrations = load_migrations(dir)?;
    tracing::debug!(dir = %dir.display(), count = migrations.len(), "loaded migrations");
    run_migrations_from_list(conn, &migrations)
}

/// Runs all pending migrations from an in-memory list, in list order.
///
/// # Errors
///
/// See [`run_migrations`].
pub fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<MigrationReport, MigrationError> {
    ensure_tracking_table(conn)?;

    let recorded = applied_migrations(conn)?;
    check_checksums(migrations, &recorded)?;

    for applied in &recorded {
        if !migrations.iter().any(|m| m.name == applied.name) {
            tracing::warn!(
                migration = applied.name.as_str(),
                "applied migration has no script on disk"
            );
        }
    }

    let mut report = MigrationReport::default();
    let mut last_applied_at = recorded.iter().map(|a| a.applied_at).max();

    for migration in migrations {
        if recorded.iter().any(|a| a.name == migration.name) {
            tracing::debug!(
                migration = migration.name.as_str(),
                "migration already applied, skipping"
            );
            report.skipped += 1;
            continue;
        }

        tracing::info!(migration = migration.name.as_str(), "applying migration");

        let applied_at = next_applied_at(last_applied_at);
        apply_one(conn, migration, applied_at).map_err(|source| {
            tracing::error!(
                migration = migration.name.as_str(),
                error = %source,
                "migration failed, halting"
            );
            MigrationError::ExecutionFailed {
                name: migration.name.clone(),
                source,
            }
        })?;

        last_applied_at = Some(applied_at);
        report.applied.push(migration.name.clone());
    }

    Ok(report)
}

fn apply_one(
    conn: &Connection,
    migration: &Migration,
    applied_at: NaiveDateTime,
) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&migration.sql)?;
    tx.execute(
        &format!("INSERT INTO {TRACKING_TABLE} (name, checksum, applied_at) VALUES (?1, ?2, ?3)"),
        params![migration.name, migration.checksum, applied_at],
    )?;
    tx.commit()
}

/// Application timestamps strictly increase across tracking rows, even when
/// the clock has not advanced since the previous migration.
fn next_applied_at(previous: Option<NaiveDateTime>) -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

fn ensure_tracking_table(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {TRACKING_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            checksum TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );"
    ))
    .map_err(|e| MigrationError::ExecutionFailed {
        name: format!("{TRACKING_TABLE}_bootstrap"),
        source: e,
    })
}

fn tracking_table_exists(conn: &Connection) -> Result<bool, MigrationError> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [TRACKING_TABLE],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(MigrationError::StateQuery)
}

fn check_checksums(
    migrations: &[Migration],
    recorded: &[AppliedMigration],
) -> Result<(), MigrationError> {
    for migration in migrations {
        if let Some(applied) = recorded.iter().find(|a| a.name == migration.name) {
            if applied.checksum != migration.checksum {
                return Err(MigrationError::ChecksumMismatch {
                    name: migration.name.clone(),
                    recorded: applied.checksum.clone(),
                    found: migration.checksum.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Returns the tracking table rows in application order.
///
/// A store that has never been migrated has no tracking table and yields
/// an empty list.
///
/// # Errors
///
/// Returns `MigrationError::StateQuery` on SQL failure.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<AppliedMigration>, MigrationError> {
    if !tracking_table_exists(conn)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare(&format!(
            "SELECT name, checksum, applied_at FROM {TRACKING_TABLE} ORDER BY id ASC"
        ))
        .map_err(MigrationError::StateQuery)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                name: row.get(0)?,
                checksum: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })
        .map_err(MigrationError::StateQuery)?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(MigrationError::StateQuery)
}

/// Reports, for every script in `dir`, whether it has been applied.
///
/// Does not create the tracking table.
///
/// # Errors
///
/// Returns `MigrationError` if the directory cannot be read or the
/// tracking table cannot be queried.
pub fn migration_status(
    conn: &Connection,
    dir: &Path,
) -> Result<Vec<MigrationStatus>, MigrationError> {
    let migrations = load_migrations(dir)?;
    let recorded = applied_migrations(conn)?;

    Ok(migrations
        .into_iter()
        .map(|migration| {
            let state = recorded
                .iter()
                .find(|a| a.name == migration.name)
                .map_or(MigrationState::Pending, |a| MigrationState::Applied {
                    applied_at: a.applied_at,
                });
            MigrationStatus {
                name: migration.name,
                state,
            }
        })
        .collect())
}
