use crate::model::{IndexDef, Partitioning, Table};

use super::alter_clause::{AlterClause, ColumnPosition};

/// Compares two tables and produces the ordered list of alter clauses that
/// would turn `from` into `to` (spec §4.1).
///
/// Short-circuits to `([], true)` when the two tables' canonical CREATE
/// text is identical. Otherwise clauses are emitted in a fixed order:
/// columns, primary key, indexes (drops before adds), foreign keys (drops
/// before adds), table-level attributes, partitioning, then auto-increment.
#[must_use]
pub fn diff(from: &Table, to: &Table) -> (Vec<AlterClause>, bool) {
    if from.canonical_create == to.canonical_create {
        return (Vec::new(), true);
    }

    let mut supported = from.is_supported() && to.is_supported();
    let mut clauses = Vec::new();

    diff_columns(from, to, &mut clauses);
    diff_primary_key(from, to, &mut clauses);
    diff_secondary_indexes(from, to, &mut clauses);
    diff_foreign_keys(from, to, &mut clauses);
    diff_table_attributes(from, to, &mut clauses);
    supported &= diff_partitioning(from, to, &mut clauses);
    diff_auto_increment(from, to, &mut clauses);

    (clauses, supported)
}

fn diff_columns(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    for column in &from.columns {
        if to.column(&column.name).is_none() {
            clauses.push(AlterClause::DropColumn { name: column.name.clone() });
        }
    }

    for (index, column) in to.columns.iter().enumerate() {
        let position = target_position(to, index);
        match from.column(&column.name) {
            None => clauses.push(AlterClause::AddColumn { column: column.clone(), position }),
            Some(existing) => {
                let same_position = from
                    .columns
                    .iter()
                    .position(|c| c.name == column.name)
                    .map(|from_index| columns_before(from, from_index) == columns_before(to, index))
                    .unwrap_or(false);
                if existing != column || !same_position {
                    let position = if same_position { None } else { position };
                    clauses.push(AlterClause::ModifyColumn { column: column.clone(), position });
                }
            }
        }
    }
}

fn columns_before(table: &Table, index: usize) -> Option<String> {
    (index > 0).then(|| table.columns[index - 1].name.clone())
}

fn target_position(to: &Table, index: usize) -> Option<ColumnPosition> {
    if index == 0 {
        Some(ColumnPosition::First)
    } else {
        Some(ColumnPosition::After(to.columns[index - 1].name.clone()))
    }
}

fn diff_primary_key(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    if from.primary_key == to.primary_key {
        return;
    }
    if from.primary_key.is_some() {
        clauses.push(AlterClause::DropIndex { name: "PRIMARY".to_string() });
    }
    if let Some(pk) = &to.primary_key {
        let mut pk = pk.clone();
        pk.name = "PRIMARY".to_string();
        clauses.push(AlterClause::AddIndex { index: pk });
    }
}

fn diff_secondary_indexes(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    let mut adds = Vec::new();

    for index in &from.secondary_indexes {
        match to.index(&index.name) {
            None => clauses.push(AlterClause::DropIndex { name: index.name.clone() }),
            Some(target) if index.visible != target.visible && same_index_shape(index, target) => {
                clauses.push(AlterClause::AlterIndexVisibility { name: index.name.clone(), visible: target.visible });
            }
            Some(target) if index != target => {
                clauses.push(AlterClause::DropIndex { name: index.name.clone() });
                adds.push(target.clone());
            }
            Some(_) => {}
        }
    }

    for index in &to.secondary_indexes {
        if from.index(&index.name).is_none() {
            adds.push(index.clone());
        }
    }

    for index in adds {
        clauses.push(AlterClause::AddIndex { index });
    }
}

fn same_index_shape(a: &IndexDef, b: &IndexDef) -> bool {
    a.index_type == b.index_type && a.unique == b.unique && a.parts == b.parts && a.comment == b.comment
}

fn diff_foreign_keys(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    for fk in &from.foreign_keys {
        match to.foreign_key(&fk.name) {
            None => {
                let rename_only = to.foreign_keys.iter().any(|candidate| fk.same_definition(candidate));
                clauses.push(AlterClause::DropForeignKey { name: fk.name.clone(), rename_only });
            }
            Some(target) if fk != target => {
                clauses.push(AlterClause::DropForeignKey { name: fk.name.clone(), rename_only: false });
            }
            Some(_) => {}
        }
    }

    for fk in &to.foreign_keys {
        match from.foreign_key(&fk.name) {
            None => {
                let rename_only = from.foreign_keys.iter().any(|candidate| fk.same_definition(candidate));
                clauses.push(AlterClause::AddForeignKey { fk: fk.clone(), rename_only });
            }
            Some(existing) if existing != fk => {
                clauses.push(AlterClause::AddForeignKey { fk: fk.clone(), rename_only: false });
            }
            Some(_) => {}
        }
    }
}

fn diff_table_attributes(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    if from.engine != to.engine {
        clauses.push(AlterClause::ChangeEngine { engine: to.engine.clone() });
    }
    if from.charset != to.charset {
        clauses.push(AlterClause::ChangeCharSet { charset: to.charset.clone() });
    }
    if from.collation != to.collation {
        clauses.push(AlterClause::ChangeCollation {
            collation: to.collation.clone(),
            is_default: to.collation_is_default,
        });
    }
    if from.row_format != to.row_format {
        clauses.push(AlterClause::ChangeRowFormat { row_format: to.row_format.clone() });
    }
    if from.comment != to.comment {
        clauses.push(AlterClause::ChangeComment { comment: to.comment.clone() });
    }
    if from.create_options != to.create_options {
        clauses.push(AlterClause::ChangeCreateOptions { create_options: to.create_options.clone() });
    }
}

/// Returns whether the partitioning change (if any) is supported.
fn diff_partitioning(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) -> bool {
    match (&from.partitioning, &to.partitioning) {
        (None, None) => true,
        (None, Some(partitioning)) => {
            clauses.push(AlterClause::AddPartitioning { partitioning: partitioning.clone() });
            true
        }
        (Some(_), None) => {
            clauses.push(AlterClause::RemovePartitioning);
            true
        }
        (Some(from_part), Some(to_part)) => diff_existing_partitioning(from_part, to_part, clauses),
    }
}

/// Returns whether the partitioning change (if any) is supported (spec §4.1:
/// changing partition method, or changing a HASH/KEY partition list, is not).
fn diff_existing_partitioning(from: &Partitioning, to: &Partitioning, clauses: &mut Vec<AlterClause>) -> bool {
    if std::mem::discriminant(&from.method) != std::mem::discriminant(&to.method) {
        return false;
    }
    if from.partitions == to.partitions {
        return true;
    }
    if from.method.supports_partition_list_changes() {
        let descriptions = describe_partition_changes(from, to);
        clauses.push(AlterClause::ModifyPartitions { descriptions });
        true
    } else {
        false
    }
}

fn describe_partition_changes(from: &Partitioning, to: &Partitioning) -> Vec<String> {
    let mut descriptions = Vec::new();
    for partition in &from.partitions {
        if !to.partitions.iter().any(|p| p.name == partition.name) {
            descriptions.push(format!("drop partition `{}`", partition.name));
        }
    }
    for partition in &to.partitions {
        if !from.partitions.iter().any(|p| p.name == partition.name) {
            descriptions.push(format!("add partition `{}`", partition.name));
        }
    }
    descriptions
}

fn diff_auto_increment(from: &Table, to: &Table, clauses: &mut Vec<AlterClause>) {
    if from.next_auto_increment != to.next_auto_increment {
        clauses.push(AlterClause::ChangeAutoIncrement {
            old: from.next_auto_increment,
            new: to.next_auto_increment,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    fn table_with_columns(name: &str, columns: &[(&str, &str)]) -> Table {
        let mut table = Table::new(name);
        for (col_name, sql_type) in columns {
            table.columns.push(Column::new(*col_name, *sql_type));
        }
        table.canonical_create = format!("{name}:{columns:?}");
        table
    }

    #[test]
    fn identical_tables_short_circuit() {
        let table = table_with_columns("t", &[("id", "int")]);
        let (clauses, supported) = diff(&table, &table);
        assert!(clauses.is_empty());
        assert!(supported);
    }

    #[test]
    fn add_then_drop_column_roundtrip() {
        let from = table_with_columns("t", &[("id", "int"), ("name", "varchar(10)")]);
        let mut to = from.clone();
        to.columns.push(Column::new("email", "varchar(255)"));
        to.canonical_create = "different".to_string();

        let (clauses, supported) = diff(&from, &to);
        assert!(supported);
        assert_eq!(clauses.len(), 1);
        assert!(matches!(&clauses[0], AlterClause::AddColumn { column, .. } if column.name == "email"));

        let (reverse_clauses, _) = diff(&to, &from);
        assert_eq!(reverse_clauses.len(), 1);
        assert!(matches!(&reverse_clauses[0], AlterClause::DropColumn { name } if name == "email"));
    }
}
