//! Migration runner and generator entry points.
//!
//! The binaries are thin wrappers: they load [`config::Config`], set up
//! logging with [`init_tracing`] and call [`run`] or [`generate`]. Both
//! open exactly one connection and close it before returning, whether the
//! work succeeded or not.

pub mod config;

use std::path::{Path, PathBuf};

use menuhub_db::{
    close_connection, load_migrations, migration_status, open_connection, run_migrations,
    verify_schema, ConnectionError, DbRuntimeSettings, MigrationError, MigrationReport,
    MigrationState,
};
use rusqlite::Connection;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError, LoggingConfig};

/// Errors surfaced by the runner binaries. Any of them ends the process
/// with a failure status.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The store could not be introspected for drift.
    #[error("failed to introspect store: {0}")]
    Introspect(rusqlite::Error),

    /// Scripts in the migrations directory have not been applied yet, so
    /// the store cannot be compared with the model.
    #[error("pending migrations {0:?}: run menuhub-migrate before generating")]
    PendingMigrations(Vec<String>),

    /// A generated migration name is not a lowercase slug.
    #[error("invalid migration name '{0}': use lowercase letters, digits and underscores")]
    InvalidName(String),

    /// A generated script could not be written.
    #[error("failed to write migration script {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Installs the global `tracing` subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn runtime_settings(config: &Config) -> DbRuntimeSettings {
    DbRuntimeSettings {
        busy_timeout_ms: config.database.busy_timeout_ms,
        ..DbRuntimeSettings::default()
    }
}

/// Opens a connection, runs `work` with it and closes it on every path.
///
/// An error from `work` takes precedence over an error on close; the close
/// failure is still logged.
fn with_connection<T>(
    config: &Config,
    work: impl FnOnce(&Connection) -> Result<T, RunError>,
) -> Result<T, RunError> {
    let conn = open_connection(&config.database.path, runtime_settings(config))?;
    let outcome = work(&conn);
    let closed = close_connection(conn);

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close)) => Err(close.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close)) => {
            tracing::warn!(error = %close, "failed to close database after error");
            Err(err)
        }
    }
}

/// Applies every pending migration to the configured store.
///
/// # Errors
///
/// Returns `RunError` if the store cannot be opened or closed, or if the
/// migration run fails (the first failing script halts the run).
pub fn run(config: &Config) -> Result<MigrationReport, RunError> {
    let dir = config.database.migrations_dir();
    tracing::info!(
        db = %config.database.path,
        dir = %dir.display(),
        "migrations started"
    );

    let result = with_connection(config, |conn| Ok(run_migrations(conn, &dir)?));
    match &result {
        Ok(report) => tracing::info!(
            applied = report.applied.len(),
            skipped = report.skipped,
            "migrations finished"
        ),
        Err(err) => tracing::error!(error = %err, "migrations failed"),
    }
    result
}

/// Writes a new migration script bringing the store in line with the
/// declared model, named `NNNN_<name>.sql` after the highest existing
/// number. Returns `None` when the store already matches.
///
/// Drift that cannot be applied automatically is written as `-- manual:`
/// comments for the author to resolve.
///
/// # Errors
///
/// Returns `RunError::InvalidName` for a bad slug,
/// `RunError::PendingMigrations` if the store is behind the migrations
/// directory, and connection, introspection, directory or write errors
/// otherwise.
pub fn generate(config: &Config, name: &str) -> Result<Option<PathBuf>, RunError> {
    if !is_slug(name) {
        return Err(RunError::InvalidName(name.to_string()));
    }
    let dir = config.database.migrations_dir();

    let script = with_connection(config, |conn| {
        let pending: Vec<String> = migration_status(conn, &dir)?
            .into_iter()
            .filter(|status| status.state == MigrationState::Pending)
            .map(|status| status.name)
            .collect();
        if !pending.is_empty() {
            return Err(RunError::PendingMigrations(pending));
        }

        let changes = verify_schema(conn).map_err(RunError::Introspect)?;
        for change in &changes {
            tracing::info!(auto = change.is_auto_applicable(), "{change}");
        }
        Ok(menuhub_schema::render_migration(&changes))
    })?;

    let Some(script) = script else {
        tracing::info!("store matches the schema model, nothing to generate");
        return Ok(None);
    };

    let path = dir.join(format!("{:04}_{name}.sql", next_sequence(&dir)?));
    std::fs::write(&path, script).map_err(|source| RunError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote migration script");
    Ok(Some(path))
}

fn is_slug(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// One past the highest numeric prefix among the scripts in `dir`.
fn next_sequence(dir: &Path) -> Result<u32, RunError> {
    let highest = load_migrations(dir)?
        .iter()
        .filter_map(|m| m.name.split('_').next()?.parse::<u32>().ok())
        .max();
    Ok(highest.map_or(0, |n| n + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_words() {
        assert!(is_slug("add_menu_item_tags"));
        assert!(is_slug("v2"));
        assert!(!is_slug(""));
        assert!(!is_slug("Add Tags"));
        assert!(!is_slug("../escape"));
    }

    #[test]
    fn sequence_continues_after_highest_prefix() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        assert_eq!(next_sequence(dir.path()).expect("empty dir"), 0);

        std::fs::write(dir.path().join("0000_init.sql"), "").expect("failed to write");
        std::fs::write(dir.path().join("0007_late.sql"), "").expect("failed to write");
        std::fs::write(dir.path().join("notes.sql"), "").expect("failed to write");
        assert_eq!(next_sequence(dir.path()).expect("populated dir"), 8);
    }
}
