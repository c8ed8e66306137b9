//! Error types for the data-access layer.

use menuhub_types::Id;
use rusqlite::ffi;

/// Which store constraint rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A foreign key did not resolve, or a delete was restricted by
    /// dependent rows.
    ForeignKey,
    NotNull,
    Unique,
    Check,
    /// A store trigger aborted the write (append-only history, immutable
    /// `created_at`).
    Trigger,
    Other,
}

impl ConstraintKind {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey,
            ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Unique,
            ffi::SQLITE_CONSTRAINT_CHECK => Self::Check,
            ffi::SQLITE_CONSTRAINT_TRIGGER => Self::Trigger,
            _ => Self::Other,
        }
    }
}

/// Errors that can occur during data-access operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store rejected a write. Not retried.
    #[error("constraint violation ({kind:?}): {message}")]
    Constraint { kind: ConstraintKind, message: String },

    /// An update or eager load addressed a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    /// A relation name is not declared on the table.
    #[error("table '{table}' has no relation '{relation}'")]
    UnknownRelation { table: String, relation: String },

    /// Integer price arithmetic overflowed.
    #[error("price overflow")]
    PriceOverflow,

    /// Any other database failure.
    #[error("store database error: {0}")]
    Database(rusqlite::Error),
}

impl StoreError {
    /// The constraint kind, if this is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint {
                    kind: ConstraintKind::from_extended_code(failure.extended_code),
                    message: message.unwrap_or_else(|| failure.to_string()),
                }
            }
            other => Self::Database(other),
        }
    }
}
