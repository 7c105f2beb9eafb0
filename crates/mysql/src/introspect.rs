//! Turns a live schema's `SHOW CREATE TABLE` text into structured [`Table`]s
//! by running each one through [`crate::parser`] — the same parser `.sql`
//! files go through, so there is exactly one code path from DDL text to the
//! in-memory model (core crate doc comment on [`Connection`]).

use tabletree_core::model::Schema;
use tabletree_core::{Connection, Result};

use crate::parser::parse_sql;

/// Lists `schema_name`'s tables and parses each one's `SHOW CREATE TABLE`
/// text into a full [`Table`](tabletree_core::model::Table), rather than the
/// core crate's text-only default (see `Connector::introspect`'s doc
/// comment). `Ok(None)` if the schema doesn't exist.
pub fn introspect_schema(connection: &mut dyn Connection, schema_name: &str) -> Result<Option<Schema>> {
    if !connection.schema_exists(schema_name)? {
        return Ok(None);
    }

    let mut schema = Schema::new(schema_name, "utf8mb4", "utf8mb4_0900_ai_ci");
    for table_name in connection.table_names()? {
        let Some(create_text) = connection.show_create_table(&table_name)? else { continue };
        let mut statement = create_text.trim().to_string();
        if !statement.ends_with(';') {
            statement.push(';');
        }
        let tables = parse_sql(&statement)?;
        for table in tables {
            schema.add_table(table);
        }
    }
    Ok(Some(schema))
}
