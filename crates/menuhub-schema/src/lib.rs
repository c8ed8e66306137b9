//! Declarative relational model for the menuhub store.
//!
//! This crate is the single source of truth for the shape of the data:
//! every table, its columns with exact SQL types and nullability, every
//! foreign key, and the inverse association each foreign key implies. It
//! performs no I/O. Two consumers read it:
//!
//! - the migration generator ([`diff`] + [`render_migration`]), which
//!   compares the model with a store's actual structure and emits DDL;
//! - the data-access layer, which follows [`Relation`]s to join and
//!   eager-load rows.
//!
//! # Column width discipline
//!
//! | Kind | SQL type |
//! |------|----------|
//! | Surrogate key | `INTEGER PRIMARY KEY AUTOINCREMENT` |
//! | Names, codes, labels | `VARCHAR(255)` (state codes `VARCHAR(10)`) |
//! | Free-form content (`ingredients`, `body`) | `TEXT` |
//! | Money (`price`) | `INTEGER` minor units |
//! | Instants | `TIMESTAMP` |
//!
//! Every foreign key is `NOT NULL` and declared `ON DELETE RESTRICT`: a
//! referenced row cannot be deleted while dependents exist.

mod ddl;
mod diff;
mod model;

pub use ddl::{create_table_sql, ddl_for, quote_ident};
pub use diff::{
    diff, render_migration, SchemaChange, StoreColumn, StoreForeignKey, StoreSchema, StoreTable,
};
pub use model::{table, SCHEMA};

use std::fmt;

/// SQL column types used by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Auto-assigned integer surrogate key.
    Serial,
    /// 64-bit integer.
    Integer,
    /// Variable-length text bounded to the given number of characters.
    Varchar(u16),
    /// Unbounded text.
    Text,
    /// Date and time without a zone.
    Timestamp,
}

impl ColumnType {
    /// The declared type name as written in DDL and reported by
    /// `PRAGMA table_info`.
    pub fn sql_name(self) -> String {
        match self {
            Self::Serial | Self::Integer => "INTEGER".to_string(),
            Self::Varchar(len) => format!("VARCHAR({len})"),
            Self::Text => "TEXT".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
        }
    }
}

/// Column default expressions the model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnDefault {
    /// The insertion time.
    CurrentTimestamp,
}

impl ColumnDefault {
    pub fn sql(self) -> &'static str {
        match self {
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }
}

/// What the store does with dependents when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

impl ReferentialAction {
    /// Keyword as written in DDL and reported by `PRAGMA foreign_key_list`.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
        }
    }
}

/// A foreign-key reference from a column to another table's column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: ReferentialAction,
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) ON DELETE {}", self.table, self.column, self.on_delete.sql())
    }
}

/// A column declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
    pub references: Option<ForeignKey>,
}

impl Column {
    /// A mandatory column of the given type.
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            default: None,
            references: None,
        }
    }

    /// The surrogate key column.
    pub const fn serial(name: &'static str) -> Self {
        Self::new(name, ColumnType::Serial)
    }

    /// A mandatory foreign key to `table.id` with restrict-on-delete.
    pub const fn foreign_key(name: &'static str, table: &'static str) -> Self {
        Self {
            references: Some(ForeignKey {
                table,
                column: "id",
                on_delete: ReferentialAction::Restrict,
            }),
            ..Self::new(name, ColumnType::Integer)
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn default_now(self) -> Self {
        Self {
            default: Some(ColumnDefault::CurrentTimestamp),
            ..self
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.ty == ColumnType::Serial
    }
}

/// Cardinality of an association as seen from the declaring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Many-to-one: the declaring table holds the foreign key `via`.
    One,
    /// One-to-many: the target table holds the foreign key `via`.
    Many,
}

/// A named association between two tables, backed by a foreign key.
///
/// Many-to-many associations are not modelled directly; they go through
/// the join tables `restaurant_owner` and `order_menu_items`, each of which
/// has two `One` relations and is the target of two `Many` relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: &'static str,
    pub via: &'static str,
}

impl Relation {
    pub const fn one(name: &'static str, target: &'static str, via: &'static str) -> Self {
        Self {
            name,
            kind: RelationKind::One,
            target,
            via,
        }
    }

    pub const fn many(name: &'static str, target: &'static str, via: &'static str) -> Self {
        Self {
            name,
            kind: RelationKind::Many,
            target,
            via,
        }
    }
}

/// A table declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub relations: &'static [Relation],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Columns that carry a foreign key, paired with it.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Column, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref().map(|fk| (c, fk)))
    }

    /// Names of the tables this table references.
    pub fn dependencies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.foreign_keys().map(|(_, fk)| fk.table)
    }
}

/// Structural problems in a model declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(&'static str),

    #[error("table '{table}' has no serial primary key")]
    MissingPrimaryKey { table: &'static str },

    #[error("{table}.{column} references unknown table '{target}'")]
    UnknownReference {
        table: &'static str,
        column: &'static str,
        target: &'static str,
    },

    #[error("foreign key {table}.{column} has no `One` relation on its own table")]
    MissingOwningRelation {
        table: &'static str,
        column: &'static str,
    },

    #[error("table '{table}' is declared before '{dependency}', which it references")]
    OutOfOrder {
        table: &'static str,
        dependency: &'static str,
    },

    #[error("relation {table}.{relation} is not backed by a foreign key")]
    UnbackedRelation {
        table: &'static str,
        relation: &'static str,
    },

    #[error("foreign key {table}.{column} has no inverse relation on '{target}'")]
    MissingInverse {
        table: &'static str,
        column: &'static str,
        target: &'static str,
    },
}

/// Checks that a model is internally consistent.
///
/// Tables must be unique, each must have a serial key, appear after every
/// table it references, and every foreign key must be mirrored by a `One`
/// relation on its own table and a `Many` relation on the target.
pub fn validate(model: &[Table]) -> Vec<ModelError> {
    let mut errors = Vec::new();

    for (idx, table) in model.iter().enumerate() {
        if model[..idx].iter().any(|t| t.name == table.name) {
            errors.push(ModelError::DuplicateTable(table.name));
        }

        if !table.columns.iter().any(Column::is_primary_key) {
            errors.push(ModelError::MissingPrimaryKey { table: table.name });
        }

        for (column, fk) in table.foreign_keys() {
            match model.iter().position(|t| t.name == fk.table) {
                None => errors.push(ModelError::UnknownReference {
                    table: table.name,
                    column: column.name,
                    target: fk.table,
                }),
                Some(pos) if pos > idx => errors.push(ModelError::OutOfOrder {
                    table: table.name,
                    dependency: fk.table,
                }),
                Some(pos) => {
                    let target = &model[pos];
                    let has_inverse = target.relations.iter().any(|r| {
                        r.kind == RelationKind::Many
                            && r.target == table.name
                            && r.via == column.name
                    });
                    if !has_inverse {
                        errors.push(ModelError::MissingInverse {
                            table: table.name,
                            column: column.name,
                            target: fk.table,
                        });
                    }
                }
            }

            let has_owning_side = table
                .relations
                .iter()
                .any(|r| {
                    r.kind == RelationKind::One && r.via == column.name && r.target == fk.table
                });
            if !has_owning_side {
                errors.push(ModelError::MissingOwningRelation {
                    table: table.name,
                    column: column.name,
                });
            }
        }

        for relation in table.relations {
            let backed = match relation.kind {
                RelationKind::One => table
                    .column(relation.via)
                    .and_then(|c| c.references)
                    .is_some_and(|fk| fk.table == relation.target),
                RelationKind::Many => model
                    .iter()
                    .find(|t| t.name == relation.target)
                    .and_then(|t| t.column(relation.via))
                    .and_then(|c| c.references)
                    .is_some_and(|fk| fk.table == table.name),
            };
            if !backed {
                errors.push(ModelError::UnbackedRelation {
                    table: table.name,
                    relation: relation.name,
                });
            }
        }
    }

    errors
}
