//! SQLite DDL rendering for model tables.

use crate::{Column, Table};

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Renders a column definition as it appears inside `CREATE TABLE` or
/// after `ALTER TABLE ... ADD COLUMN`.
pub(crate) fn column_definition(column: &Column) -> String {
    let mut def = format!("{} {}", quote_ident(column.name), column.ty.sql_name());

    if column.is_primary_key() {
        def.push_str(" PRIMARY KEY AUTOINCREMENT");
        return def;
    }
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = column.default {
        def.push_str(" DEFAULT ");
        def.push_str(default.sql());
    }
    if let Some(fk) = column.references {
        def.push_str(&format!(
            " REFERENCES {} ({}) ON DELETE {}",
            quote_ident(fk.table),
            quote_ident(fk.column),
            fk.on_delete.sql()
        ));
    }
    def
}

/// Renders the `CREATE TABLE` statement for one table.
pub fn create_table_sql(table: &Table) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("    {}", column_definition(c)))
        .collect();
    format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_ident(table.name),
        columns.join(",\n")
    )
}

/// Renders `CREATE TABLE` statements for every table, in model order.
pub fn ddl_for(tables: &[Table]) -> String {
    tables
        .iter()
        .map(create_table_sql)
        .collect::<Vec<_>>()
        .join("\n\n")
}
