use crate::model::Schema;

use super::alter_clause::AlterClause;
use super::ordering::order_table_diffs;
use super::table_diff::{SchemaDiff, TableDiff};
use super::table_differ;

/// Drives the table differ across two schemas and emits schema-level DDL
/// (spec §4.2). `server_defaults` is the `(charset, collation)` pair a
/// freshly created database would get with no explicit clause, used to
/// decide whether `CREATE`/`ALTER DATABASE` needs an explicit charset or
/// collation clause at all.
#[must_use]
pub fn diff_schemas(
    from: Option<&Schema>,
    to: Option<&Schema>,
    server_defaults: (&str, &str),
) -> SchemaDiff {
    let schema_ddl = schema_level_ddl(from, to, server_defaults);
    let mut table_diffs = Vec::new();
    let mut unsupported_tables = std::collections::BTreeSet::new();

    match (from, to) {
        (None, None) => {}
        (None, Some(to)) => {
            for table in to.tables.values() {
                table_diffs.push(TableDiff::Create { to: table.clone() });
            }
        }
        (Some(from), None) => {
            for table in from.tables.values() {
                table_diffs.push(TableDiff::Drop { from: table.clone() });
            }
        }
        (Some(from), Some(to)) => {
            for (name, from_table) in &from.tables {
                match to.tables.get(name) {
                    None => table_diffs.push(TableDiff::Drop { from: from_table.clone() }),
                    Some(to_table) => {
                        let (clauses, supported) = table_differ::diff(from_table, to_table);
                        if !supported {
                            unsupported_tables.insert(name.clone());
                            continue;
                        }
                        if !clauses.is_empty() {
                            let alter = TableDiff::Alter {
                                from: from_table.clone(),
                                to: to_table.clone(),
                                clauses,
                                supported,
                            };
                            table_diffs.extend(split_fk_alter(alter));
                        }
                    }
                }
            }
            for (name, to_table) in &to.tables {
                if !from.tables.contains_key(name) {
                    table_diffs.push(TableDiff::Create { to: to_table.clone() });
                }
            }
        }
    }

    SchemaDiff { schema_ddl, table_diffs: order_table_diffs(table_diffs), unsupported_tables }
}

fn schema_level_ddl(from: Option<&Schema>, to: Option<&Schema>, server_defaults: (&str, &str)) -> String {
    match (from, to) {
        (None, None) => String::new(),
        (None, Some(to)) => create_database_ddl(to, server_defaults),
        (Some(from), None) => format!("DROP DATABASE `{}`", from.name),
        (Some(from), Some(to)) => {
            if from.charset == to.charset && from.collation == to.collation {
                String::new()
            } else {
                format!(
                    "ALTER DATABASE `{}` CHARACTER SET {} COLLATE {}",
                    to.name, to.charset, to.collation
                )
            }
        }
    }
}

fn create_database_ddl(to: &Schema, server_defaults: (&str, &str)) -> String {
    let (default_charset, default_collation) = server_defaults;
    if to.charset == default_charset && to.collation == default_collation {
        format!("CREATE DATABASE `{}`", to.name)
    } else {
        format!("CREATE DATABASE `{}` CHARACTER SET {} COLLATE {}", to.name, to.charset, to.collation)
    }
}

/// Splits an `Alter` whose clauses mix foreign-key additions with anything
/// else into two consecutive `Alter`s on the same table, so drops (and any
/// other change) land before adds (spec §4.2's "FK splitting").
fn split_fk_alter(alter: TableDiff) -> Vec<TableDiff> {
    let TableDiff::Alter { from, to, clauses, supported } = alter else {
        return vec![alter];
    };

    let has_add_fk = clauses.iter().any(|c| matches!(c, AlterClause::AddForeignKey { .. }));
    let has_other = clauses.iter().any(|c| !matches!(c, AlterClause::AddForeignKey { .. }));

    if !(has_add_fk && has_other) {
        return vec![TableDiff::Alter { from, to, clauses, supported }];
    }

    let (adds, rest): (Vec<_>, Vec<_>) =
        clauses.into_iter().partition(|c| matches!(c, AlterClause::AddForeignKey { .. }));

    vec![
        TableDiff::Alter { from: from.clone(), to: to.clone(), clauses: rest, supported },
        TableDiff::Alter { from, to, clauses: adds, supported },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ForeignKey, ForeignKeyAction, Table};

    fn schema_with(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new("app", "utf8mb4", "utf8mb4_0900_ai_ci");
        for table in tables {
            schema.add_table(table);
        }
        schema
    }

    #[test]
    fn diffing_a_schema_against_itself_is_empty() {
        let mut t1 = Table::new("t1");
        t1.columns.push(Column::new("id", "int"));
        t1.canonical_create = "CREATE TABLE t1 (id int)".to_string();
        let schema = schema_with(vec![t1]);

        let diff = diff_schemas(Some(&schema), Some(&schema), ("utf8mb4", "utf8mb4_0900_ai_ci"));
        assert!(diff.table_diffs.is_empty());
        assert_eq!(diff.schema_ddl, "");
    }

    #[test]
    fn none_to_none_is_empty_diff() {
        let diff = diff_schemas(None, None, ("utf8mb4", "utf8mb4_0900_ai_ci"));
        assert!(diff.is_empty());
    }

    #[test]
    fn none_to_schema_emits_create_database_and_creates() {
        let mut t1 = Table::new("t1");
        t1.canonical_create = "CREATE TABLE t1 ()".to_string();
        let schema = schema_with(vec![t1]);

        let diff = diff_schemas(None, Some(&schema), ("latin1", "latin1_swedish_ci"));
        assert!(diff.schema_ddl.starts_with("CREATE DATABASE"));
        assert_eq!(diff.table_diffs.len(), 1);
        assert!(matches!(&diff.table_diffs[0], TableDiff::Create { to } if to.name == "t1"));
    }

    #[test]
    fn fk_rename_with_other_change_splits_into_two_alters() {
        let mut from_table = Table::new("orders");
        from_table.comment = Some("old".to_string());
        from_table.foreign_keys.push(ForeignKey {
            name: "f2".to_string(),
            columns: vec!["customer_id".to_string()],
            referenced_schema: None,
            referenced_table: "customers".to_string(),
            referenced_columns: vec!["id".to_string()],
            on_update: ForeignKeyAction::Restrict,
            on_delete: ForeignKeyAction::Restrict,
        });
        from_table.canonical_create = "from".to_string();

        let mut to_table = from_table.clone();
        to_table.comment = Some("new".to_string());
        to_table.foreign_keys[0].referenced_columns = vec!["uuid".to_string()];
        to_table.canonical_create = "to".to_string();

        let from_schema = schema_with(vec![from_table]);
        let to_schema = schema_with(vec![to_table]);

        let diff = diff_schemas(Some(&from_schema), Some(&to_schema), ("utf8mb4", "utf8mb4_0900_ai_ci"));
        assert_eq!(diff.table_diffs.len(), 2);
        let TableDiff::Alter { clauses: first_clauses, .. } = &diff.table_diffs[0] else {
            panic!("expected alter");
        };
        assert!(first_clauses.iter().any(|c| matches!(c, AlterClause::DropForeignKey { .. })));
        assert!(first_clauses.iter().any(|c| matches!(c, AlterClause::ChangeComment { .. })));
        let TableDiff::Alter { clauses: second_clauses, .. } = &diff.table_diffs[1] else {
            panic!("expected alter");
        };
        assert_eq!(second_clauses.len(), 1);
        assert!(matches!(&second_clauses[0], AlterClause::AddForeignKey { .. }));
    }
}
