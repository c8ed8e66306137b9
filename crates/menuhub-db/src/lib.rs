//! Database layer for the menuhub store.
//!
//! Provides SQLite connections (a single connection for the migration
//! runner, an `r2d2` pool for data access), the directory-based migration
//! runner, and structural verification of a store against the
//! `menuhub-schema` model.
//!
//! # Design decisions
//!
//! - **SQLite with foreign keys enforced**: every connection turns on
//!   `PRAGMA foreign_keys`, so dangling references and deletes of
//!   referenced rows are rejected by the engine itself.
//! - **Migrations on disk**: scripts live in a directory and are applied in
//!   file-name order. The scripts that ship with the crate are under
//!   [`bundled_migrations_dir`].
//! - **One transaction per script**: a script and its tracking row commit
//!   together, so the tracking table never claims a half-applied script.

mod introspect;
mod migrations;
mod pool;

pub use introspect::{introspect, verify_schema};
pub use migrations::{
    applied_migrations, bundled_migrations_dir, load_migrations, migration_status, run_migrations,
    run_migrations_from_list, AppliedMigration, Migration, MigrationError, MigrationReport,
    MigrationState, MigrationStatus, TRACKING_TABLE,
};
pub use pool::{
    close_connection, create_pool, open_connection, ConnectionError, DbPool, DbRuntimeSettings,
};
