//! Reads the live structure of a store and compares it with the model.

use menuhub_schema::{
    diff, quote_ident, SchemaChange, StoreColumn, StoreForeignKey, StoreSchema, StoreTable, SCHEMA,
};
use rusqlite::{Connection, Result};

use crate::migrations::TRACKING_TABLE;

/// Describes every user table of the store.
///
/// SQLite's internal tables and the migration tracking table are excluded.
/// Tables are returned in name order.
pub fn introspect(conn: &Connection) -> Result<StoreSchema> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name != ?1
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([TRACKING_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        tables.push(StoreTable {
            columns: table_columns(conn, &name)?,
            foreign_keys: table_foreign_keys(conn, &name)?,
            name,
        });
    }

    Ok(StoreSchema { tables })
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<StoreColumn>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(StoreColumn {
                name: row.get("name")?,
                declared_type: row.get("type")?,
                not_null: row.get("notnull")?,
                default: row.get("dflt_value")?,
                primary_key: row.get::<_, i64>("pk")? > 0,
            })
        })?
        .collect();
    columns
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<StoreForeignKey>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", quote_ident(table)))?;
    let foreign_keys = stmt
        .query_map([], |row| {
            Ok(StoreForeignKey {
                column: row.get("from")?,
                table: row.get("table")?,
                to_column: row.get("to")?,
                on_delete: row.get("on_delete")?,
            })
        })?
        .collect();
    foreign_keys
}

/// Compares the store with the declared model.
///
/// An empty result means every declared table exists with exactly the
/// declared columns, nullability, defaults and foreign keys, and nothing
/// else is present.
pub fn verify_schema(conn: &Connection) -> Result<Vec<SchemaChange<'static>>> {
    let store = introspect(conn)?;
    Ok(diff(SCHEMA, &store))
}
