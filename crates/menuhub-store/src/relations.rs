//! Relation traversal driven by the declared schema model.

use menuhub_schema::{quote_ident, table, RelationKind};
use menuhub_types::Id;
use rusqlite::{Connection, OptionalExtension};

use crate::StoreError;

/// Follows a named relation from one row and returns the ids it reaches.
///
/// A `One` relation yields at most one id (the referenced row); a `Many`
/// relation yields the ids of every row pointing back, in id order.
pub fn follow(
    conn: &Connection,
    table_name: &str,
    relation: &str,
    id: Id,
) -> Result<Vec<Id>, StoreError> {
    let unknown = || StoreError::UnknownRelation {
        table: table_name.to_string(),
        relation: relation.to_string(),
    };
    let declared = table(table_name).ok_or_else(unknown)?;
    let rel = declared.relation(relation).ok_or_else(unknown)?;

    match rel.kind {
        RelationKind::One => {
            let sql = format!(
                "SELECT {} FROM {} WHERE id = ?1",
                quote_ident(rel.via),
                quote_ident(declared.name)
            );
            let target: Option<Id> = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
            Ok(target.into_iter().collect())
        }
        RelationKind::Many => {
            let sql = format!(
                "SELECT id FROM {} WHERE {} = ?1 ORDER BY id",
                quote_ident(rel.target),
                quote_ident(rel.via)
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map([id], |row| row.get(0))?
                .collect::<Result<Vec<Id>, _>>()?;
            Ok(ids)
        }
    }
}
