//! Store connections: a single connection for the migration runner and a
//! pool for the data-access layer. Both apply the same session settings.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when acquiring or releasing store connections.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The database file could not be opened.
    #[error("failed to open database '{path}': {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    /// Session settings (journal mode, foreign keys, busy timeout) could not
    /// be applied.
    #[error("failed to configure database connection: {0}")]
    Configure(rusqlite::Error),

    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),

    /// The connection could not be closed cleanly.
    #[error("failed to close database connection: {0}")]
    Close(rusqlite::Error),
}

fn open_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX
}

/// Applies WAL mode, foreign-key enforcement and the busy timeout.
///
/// Foreign keys are off by default in SQLite and must be enabled on every
/// connection.
fn configure(conn: &Connection, settings: DbRuntimeSettings) -> rusqlite::Result<()> {
    // In-memory databases report "memory" which is expected and acceptable.
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "failed to set WAL journal mode, got: {}",
                journal_mode
            )),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        settings.busy_timeout_ms
    ))
}

/// Opens a single configured connection.
///
/// The migration runner holds exactly one of these for its whole run and
/// hands it to [`close_connection`] when done.
///
/// # Errors
///
/// Returns `ConnectionError::Open` if the file cannot be opened or
/// `ConnectionError::Configure` if the session settings are rejected.
pub fn open_connection(
    db_path: &str,
    settings: DbRuntimeSettings,
) -> Result<Connection, ConnectionError> {
    let conn = Connection::open_with_flags(db_path, open_flags()).map_err(|source| {
        ConnectionError::Open {
            path: db_path.to_string(),
            source,
        }
    })?;
    configure(&conn, settings).map_err(ConnectionError::Configure)?;
    tracing::debug!(path = db_path, "opened database connection");
    Ok(conn)
}

/// Closes a connection, surfacing any error SQLite reports on close.
///
/// # Errors
///
/// Returns `ConnectionError::Close` if outstanding statements prevent a
/// clean close; the connection is dropped either way.
pub fn close_connection(conn: Connection) -> Result<(), ConnectionError> {
    conn.close().map_err(|(_, e)| ConnectionError::Close(e))?;
    tracing::debug!("closed database connection");
    Ok(())
}

/// Creates a new SQLite connection pool with WAL mode and foreign keys enabled.
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file. Use `:memory:` for an
///   in-memory database (useful for testing).
///
/// # Errors
///
/// Returns `ConnectionError::PoolInit` if the connection pool cannot be created.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, ConnectionError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(open_flags())
        .with_init(move |conn| configure(conn, settings));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    Ok(pool)
}
