use std::collections::BTreeMap;

use super::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub charset: String,
    pub collation: String,
    pub tables: BTreeMap<String, Table>,
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>, charset: impl Into<String>, collation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charset: charset.into(),
            collation: collation.into(),
            tables: BTreeMap::new(),
        }
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }
}
