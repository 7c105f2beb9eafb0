use std::collections::BTreeSet;

use crate::model::Table;

use super::alter_clause::AlterClause;

/// One table's worth of change between two schemas (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum TableDiff {
    Create { to: Table },
    Drop { from: Table },
    Alter { from: Table, to: Table, clauses: Vec<AlterClause>, supported: bool },
}

impl TableDiff {
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Create { to } => &to.name,
            Self::Drop { from } => &from.name,
            Self::Alter { to, .. } => &to.name,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Alter { supported: false, .. })
    }
}

/// Schema-level DDL plus an ordered sequence of table diffs (spec §3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDiff {
    pub schema_ddl: String,
    pub table_diffs: Vec<TableDiff>,
    pub unsupported_tables: BTreeSet<String>,
}

impl SchemaDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schema_ddl.is_empty() && self.table_diffs.is_empty()
    }
}
