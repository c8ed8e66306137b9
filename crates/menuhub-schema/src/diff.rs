//! Model-versus-store comparison and migration script generation.
//!
//! The store's structure is described by [`StoreSchema`], a plain value the
//! database crate fills in from `PRAGMA table_info` and
//! `PRAGMA foreign_key_list`. [`diff`] lists every way the store differs
//! from the model; [`render_migration`] turns that list into a script.
//! Changes SQLite cannot express in place (type changes, dropped columns,
//! new foreign keys on existing columns) are emitted as `-- manual:` lines
//! for an operator to resolve.

use std::fmt;

use crate::ddl::{column_definition, create_table_sql, quote_ident};
use crate::{Column, Table};

/// Observed structure of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSchema {
    pub tables: Vec<StoreTable>,
}

/// Observed structure of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreTable {
    pub name: String,
    pub columns: Vec<StoreColumn>,
    pub foreign_keys: Vec<StoreForeignKey>,
}

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

/// One row of `PRAGMA foreign_key_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreForeignKey {
    pub column: String,
    pub table: String,
    pub to_column: Option<String>,
    pub on_delete: String,
}

impl StoreSchema {
    pub fn table(&self, name: &str) -> Option<&StoreTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl StoreTable {
    pub fn column(&self, name: &str) -> Option<&StoreColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&StoreForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

impl fmt::Display for StoreForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) ON DELETE {}",
            self.table,
            self.to_column.as_deref().unwrap_or("<primary key>"),
            self.on_delete
        )
    }
}

/// A single difference between the model and a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange<'a> {
    /// The table is declared but absent from the store.
    CreateTable(&'a Table),
    /// The column is declared but absent from an existing table.
    AddColumn { table: &'a Table, column: &'a Column },
    /// The store has a table the model does not declare.
    UnexpectedTable(String),
    /// An existing table has a column the model does not declare.
    UnexpectedColumn { table: &'a Table, column: String },
    /// Type, nullability, default or key differs.
    ColumnMismatch {
        table: &'a Table,
        column: &'a Column,
        found: String,
    },
    /// The column's foreign key is missing, extra or points elsewhere.
    ForeignKeyMismatch {
        table: &'a Table,
        column: &'a Column,
        found: Option<String>,
    },
}

impl SchemaChange<'_> {
    /// Whether [`render_migration`] emits executable DDL for this change.
    ///
    /// Only nullable columns without a default qualify: SQLite rejects
    /// `ADD COLUMN` for `NOT NULL` columns lacking a default and for
    /// non-constant defaults such as `CURRENT_TIMESTAMP`.
    pub fn is_auto_applicable(&self) -> bool {
        match self {
            Self::CreateTable(_) => true,
            Self::AddColumn { column, .. } => column.nullable && column.default.is_none(),
            _ => false,
        }
    }
}

impl fmt::Display for SchemaChange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable(table) => write!(f, "table '{}' is missing", table.name),
            Self::AddColumn { table, column } => {
                write!(f, "column {}.{} is missing", table.name, column.name)
            }
            Self::UnexpectedTable(name) => write!(f, "table '{name}' is not declared"),
            Self::UnexpectedColumn { table, column } => {
                write!(f, "column {}.{column} is not declared", table.name)
            }
            Self::ColumnMismatch { table, column, found } => write!(
                f,
                "column {}.{} should be `{}` but is `{found}`",
                table.name,
                column.name,
                column_definition(column)
            ),
            Self::ForeignKeyMismatch { table, column, found } => {
                let expected = column
                    .references
                    .map_or_else(|| "no foreign key".to_string(), |fk| fk.to_string());
                write!(
                    f,
                    "foreign key on {}.{} should be {expected} but is {}",
                    table.name,
                    column.name,
                    found.as_deref().unwrap_or("absent")
                )
            }
        }
    }
}

fn normalize_sql(text: &str) -> String {
    let trimmed = text.trim();
    let unwrapped = trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(trimmed);
    unwrapped
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn describe(found: &StoreColumn) -> String {
    let mut desc = found.declared_type.clone();
    if found.primary_key {
        desc.push_str(" PRIMARY KEY");
    }
    if found.not_null {
        desc.push_str(" NOT NULL");
    }
    if let Some(default) = &found.default {
        desc.push_str(" DEFAULT ");
        desc.push_str(default);
    }
    desc
}

fn column_matches(column: &Column, found: &StoreColumn) -> bool {
    if normalize_sql(&column.ty.sql_name()) != normalize_sql(&found.declared_type) {
        return false;
    }
    if column.is_primary_key() {
        return found.primary_key;
    }
    let default_matches = match (column.default, &found.default) {
        (None, None) => true,
        (Some(expected), Some(actual)) => normalize_sql(expected.sql()) == normalize_sql(actual),
        _ => false,
    };
    !found.primary_key && found.not_null != column.nullable && default_matches
}

fn foreign_key_matches(column: &Column, found: Option<&StoreForeignKey>) -> bool {
    match (column.references, found) {
        (None, None) => true,
        (Some(expected), Some(actual)) => {
            actual.table == expected.table
                && actual.to_column.as_deref().unwrap_or("id") == expected.column
                && normalize_sql(&actual.on_delete) == normalize_sql(expected.on_delete.sql())
        }
        _ => false,
    }
}

/// Lists every difference between `model` and `store`.
///
/// Changes for declared tables come first, in model order, followed by
/// tables the store has but the model does not declare. An empty result
/// means the store matches the model exactly.
pub fn diff<'a>(model: &'a [Table], store: &StoreSchema) -> Vec<SchemaChange<'a>> {
    let mut changes = Vec::new();

    for table in model {
        let Some(found) = store.table(table.name) else {
            changes.push(SchemaChange::CreateTable(table));
            continue;
        };

        for column in table.columns {
            let Some(found_column) = found.column(column.name) else {
                changes.push(SchemaChange::AddColumn { table, column });
                continue;
            };

            if !column_matches(column, found_column) {
                changes.push(SchemaChange::ColumnMismatch {
                    table,
                    column,
                    found: describe(found_column),
                });
            }

            let found_fk = found.foreign_key(column.name);
            if !foreign_key_matches(column, found_fk) {
                changes.push(SchemaChange::ForeignKeyMismatch {
                    table,
                    column,
                    found: found_fk.map(ToString::to_string),
                });
            }
        }

        for found_column in &found.columns {
            if table.column(&found_column.name).is_none() {
                changes.push(SchemaChange::UnexpectedColumn {
                    table,
                    column: found_column.name.clone(),
                });
            }
        }
    }

    for found in &store.tables {
        if !model.iter().any(|t| t.name == found.name) {
            changes.push(SchemaChange::UnexpectedTable(found.name.clone()));
        }
    }

    changes
}

/// Renders a migration script for `changes`, or `None` when there are none.
pub fn render_migration(changes: &[SchemaChange<'_>]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }

    let mut statements = vec!["-- Generated from the menuhub schema model.".to_string()];
    for change in changes {
        let statement = match change {
            SchemaChange::CreateTable(table) => create_table_sql(table),
            SchemaChange::AddColumn { table, column } if change.is_auto_applicable() => format!(
                "ALTER TABLE {} ADD COLUMN {};",
                quote_ident(table.name),
                column_definition(column)
            ),
            other => format!("-- manual: {other}"),
        };
        statements.push(statement);
    }

    let mut script = statements.join("\n\n");
    script.push('\n');
    Some(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{table, ColumnType, SCHEMA};

    fn store_column(name: &str, declared_type: &str, not_null: bool) -> StoreColumn {
        StoreColumn {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null,
            default: None,
            primary_key: false,
        }
    }

    fn matching_state() -> StoreTable {
        StoreTable {
            name: "state".to_string(),
            columns: vec![
                StoreColumn {
                    primary_key: true,
                    ..store_column("id", "INTEGER", false)
                },
                store_column("name", "varchar(255)", true),
                store_column("code", "VARCHAR(10)", true),
                store_column("country", "VARCHAR(255)", true),
            ],
            foreign_keys: Vec::new(),
        }
    }

    #[test]
    fn empty_store_needs_every_table() {
        let changes = diff(SCHEMA, &StoreSchema::default());
        assert_eq!(changes.len(), SCHEMA.len());
        assert!(changes.iter().all(SchemaChange::is_auto_applicable));

        let script = render_migration(&changes).expect("script should be rendered");
        let first_state = script.find("CREATE TABLE \"state\"").expect("state table");
        let first_city = script.find("CREATE TABLE \"city\"").expect("city table");
        assert!(first_state < first_city, "parents must be created first");
    }

    #[test]
    fn matching_table_produces_no_changes() {
        let state = table("state").expect("state should exist");
        let store = StoreSchema {
            tables: vec![matching_state()],
        };
        assert!(diff(std::slice::from_ref(state), &store).is_empty());
        assert_eq!(render_migration(&[]), None);
    }

    #[test]
    fn detects_type_and_nullability_drift() {
        let state = table("state").expect("state should exist");
        let mut found = matching_state();
        found.columns[2] = store_column("code", "TEXT", true);
        found.columns[3] = store_column("country", "VARCHAR(255)", false);

        let store = StoreSchema { tables: vec![found] };
        let changes = diff(std::slice::from_ref(state), &store);
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            &changes[0],
            SchemaChange::ColumnMismatch { column, .. } if column.name == "code"
        ));
        assert!(changes[1].to_string().contains("state.country"));
    }

    #[test]
    fn detects_unexpected_tables_and_columns() {
        let state = table("state").expect("state should exist");
        let mut found = matching_state();
        found.columns.push(store_column("flag_url", "TEXT", false));

        let store = StoreSchema {
            tables: vec![
                found,
                StoreTable {
                    name: "legacy".to_string(),
                    ..StoreTable::default()
                },
            ],
        };
        let changes = diff(std::slice::from_ref(state), &store);
        assert_eq!(
            changes,
            [
                SchemaChange::UnexpectedColumn {
                    table: state,
                    column: "flag_url".to_string(),
                },
                SchemaChange::UnexpectedTable("legacy".to_string()),
            ]
        );

        let script = render_migration(&changes).expect("script should be rendered");
        assert!(script.contains("-- manual: column state.flag_url is not declared"));
    }

    #[test]
    fn detects_foreign_key_with_wrong_delete_rule() {
        let city = table("city").expect("city should exist");
        let store = StoreSchema {
            tables: vec![StoreTable {
                name: "city".to_string(),
                columns: vec![
                    StoreColumn {
                        primary_key: true,
                        ..store_column("id", "INTEGER", false)
                    },
                    store_column("name", "VARCHAR(255)", true),
                    store_column("zipcode", "INTEGER", true),
                    store_column("address", "VARCHAR(255)", true),
                    store_column("state_id", "INTEGER", true),
                    store_column("country", "VARCHAR(255)", true),
                ],
                foreign_keys: vec![StoreForeignKey {
                    column: "state_id".to_string(),
                    table: "state".to_string(),
                    to_column: Some("id".to_string()),
                    on_delete: "CASCADE".to_string(),
                }],
            }],
        };

        let changes = diff(std::slice::from_ref(city), &store);
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            SchemaChange::ForeignKeyMismatch { found: Some(found), .. }
                if found.ends_with("CASCADE")
        ));
    }

    #[test]
    fn only_undefaulted_nullable_columns_render_as_add_column() {
        const EXTENDED: Table = Table {
            name: "state",
            columns: &[
                Column::serial("id"),
                Column::new("name", ColumnType::Varchar(255)),
                Column::new("code", ColumnType::Varchar(10)),
                Column::new("country", ColumnType::Varchar(255)),
                Column::new("flag_url", ColumnType::Text).nullable(),
                Column::new("population", ColumnType::Integer),
                Column::new("reviewed_at", ColumnType::Timestamp)
                    .nullable()
                    .default_now(),
            ],
            relations: &[],
        };
        let store = StoreSchema {
            tables: vec![matching_state()],
        };

        let changes = diff(std::slice::from_ref(&EXTENDED), &store);
        assert_eq!(changes.len(), 3);
        assert!(changes[0].is_auto_applicable());
        assert!(!changes[1].is_auto_applicable());
        assert!(!changes[2].is_auto_applicable());

        let script = render_migration(&changes).expect("script should be rendered");
        assert!(script.contains("ALTER TABLE \"state\" ADD COLUMN \"flag_url\" TEXT;"));
        assert!(script.contains("-- manual: column state.population is missing"));
        assert!(script.contains("-- manual: column state.reviewed_at is missing"));
        assert!(!script.contains("ADD COLUMN \"reviewed_at\""));
    }
}
