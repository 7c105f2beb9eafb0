use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::Table;

use super::table_diff::TableDiff;

/// Orders `Create` diffs so that a table referencing another table via
/// foreign key is created after the table it references, falling back to
/// input order when the reference graph has a cycle (spec §4.2, §9): MySQL
/// accepts out-of-order `CREATE TABLE` as long as the referenced table does
/// not exist yet, which is the common case for a from-scratch schema.
#[must_use]
pub fn order_creates(creates: Vec<Table>) -> Vec<Table> {
    if creates.len() < 2 {
        return creates;
    }

    let names: BTreeSet<&str> = creates.iter().map(|t| t.name.as_str()).collect();
    let mut in_degree: BTreeMap<&str, usize> = creates.iter().map(|t| (t.name.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for table in &creates {
        for fk in &table.foreign_keys {
            if fk.referenced_table == table.name {
                continue;
            }
            if names.contains(fk.referenced_table.as_str()) {
                dependents.entry(fk.referenced_table.as_str()).or_default().push(table.name.as_str());
                *in_degree.get_mut(table.name.as_str()).unwrap() += 1;
            }
        }
    }

    let by_name: BTreeMap<&str, usize> =
        creates.iter().enumerate().map(|(index, table)| (table.name.as_str(), index)).collect();

    let mut queue: VecDeque<&str> = creates
        .iter()
        .map(|t| t.name.as_str())
        .filter(|name| in_degree[name] == 0)
        .collect();
    let mut order = Vec::with_capacity(creates.len());
    let mut visited = BTreeSet::new();

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name) {
            continue;
        }
        order.push(name);
        if let Some(children) = dependents.get(name) {
            for child in children {
                let degree = in_degree.get_mut(child).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    if order.len() != creates.len() {
        // Cycle detected: fall back to the caller's original order.
        return creates;
    }

    let order_indices: Vec<usize> = order.into_iter().map(|name| by_name[name]).collect();

    let mut creates: Vec<Option<Table>> = creates.into_iter().map(Some).collect();
    order_indices
        .into_iter()
        .map(|index| creates[index].take().expect("each table consumed once"))
        .collect()
}

/// Orders table diffs as spec §4.2 requires: drops first (to free names),
/// then alters, then creates (the creates themselves already topologically
/// sorted by `order_creates`).
#[must_use]
pub fn order_table_diffs(diffs: Vec<TableDiff>) -> Vec<TableDiff> {
    let mut drops = Vec::new();
    let mut alters = Vec::new();
    let mut create_tables = Vec::new();

    for diff in diffs {
        match diff {
            TableDiff::Drop { .. } => drops.push(diff),
            TableDiff::Alter { .. } => alters.push(diff),
            TableDiff::Create { to } => create_tables.push(to),
        }
    }

    let mut ordered = drops;
    ordered.extend(alters);
    ordered.extend(order_creates(create_tables).into_iter().map(|to| TableDiff::Create { to }));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForeignKey, ForeignKeyAction};

    fn table_referencing(name: &str, referenced: Option<&str>) -> Table {
        let mut table = Table::new(name);
        if let Some(referenced) = referenced {
            table.foreign_keys.push(ForeignKey {
                name: format!("fk_{name}"),
                columns: vec!["ref_id".to_string()],
                referenced_schema: None,
                referenced_table: referenced.to_string(),
                referenced_columns: vec!["id".to_string()],
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Restrict,
            });
        }
        table
    }

    #[test]
    fn orders_referenced_table_first() {
        let child = table_referencing("orders", Some("customers"));
        let parent = table_referencing("customers", None);
        let ordered = order_creates(vec![child, parent]);
        assert_eq!(ordered[0].name, "customers");
        assert_eq!(ordered[1].name, "orders");
    }

    #[test]
    fn falls_back_to_input_order_on_cycle() {
        let a = table_referencing("a", Some("b"));
        let b = table_referencing("b", Some("a"));
        let ordered = order_creates(vec![a, b]);
        assert_eq!(ordered[0].name, "a");
        assert_eq!(ordered[1].name, "b");
    }
}
