use crate::model::{Column, ForeignKey, IndexDef, Partitioning};
use crate::modifiers::StatementModifiers;

/// Where a new or modified column sits relative to its siblings, so the
/// differ can preserve target column order via `AFTER`/`FIRST` (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    First,
    After(String),
}

impl ColumnPosition {
    fn render(&self) -> String {
        match self {
            Self::First => " FIRST".to_string(),
            Self::After(name) => format!(" AFTER `{name}`"),
        }
    }
}

/// One mutation within an `ALTER TABLE` (spec §3). Each variant renders its
/// own DDL fragment given the active statement modifiers, and knows whether
/// it is destructive.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterClause {
    AddColumn { column: Column, position: Option<ColumnPosition> },
    DropColumn { name: String },
    ModifyColumn { column: Column, position: Option<ColumnPosition> },
    AddIndex { index: IndexDef },
    DropIndex { name: String },
    AlterIndexVisibility { name: String, visible: bool },
    /// `rename_only` marks a drop/add pair produced solely because the same
    /// foreign key definition exists under a different name on each side
    /// (spec §4.1): such pairs render empty unless `StrictForeignKeyNaming`.
    AddForeignKey { fk: ForeignKey, rename_only: bool },
    DropForeignKey { name: String, rename_only: bool },
    /// Never emitted by the table differ (no rename detection in the core,
    /// per spec §4.1) but kept as a variant so a caller with external
    /// rename knowledge (e.g. an annotation) can still construct one.
    RenameColumn { from: String, to: String },
    ChangeCharSet { charset: String },
    ChangeCollation { collation: String, is_default: bool },
    ChangeComment { comment: Option<String> },
    ChangeEngine { engine: String },
    ChangeAutoIncrement { old: u64, new: u64 },
    ChangeRowFormat { row_format: Option<String> },
    ChangeCreateOptions { create_options: Option<String> },
    AddPartitioning { partitioning: Partitioning },
    RemovePartitioning,
    /// RANGE/LIST partition list changes. Advisory only: the partition
    /// definitions themselves are not replayed as DDL (spec §4.1), so this
    /// always renders to an empty fragment.
    ModifyPartitions { descriptions: Vec<String> },
}

impl AlterClause {
    #[must_use]
    pub fn is_unsafe(&self) -> bool {
        matches!(self, Self::DropColumn { .. })
    }

    /// Whether this clause participates in the `NextAutoInc`-gated
    /// auto-increment-only shortcut (spec §4.3): it only applies when
    /// `ChangeAutoIncrement` is the *sole* clause in the alter.
    #[must_use]
    pub fn is_change_auto_increment(&self) -> bool {
        matches!(self, Self::ChangeAutoIncrement { .. })
    }

    #[must_use]
    pub fn render(&self, mods: &StatementModifiers) -> String {
        match self {
            Self::AddColumn { column, position } => {
                format!("ADD COLUMN {}{}", render_column_def(column), render_position(position))
            }
            Self::DropColumn { name } => format!("DROP COLUMN `{name}`"),
            Self::ModifyColumn { column, position } => {
                format!("MODIFY COLUMN {}{}", render_column_def(column), render_position(position))
            }
            Self::AddIndex { index } => render_add_index(index),
            Self::DropIndex { name } => render_drop_index(name),
            Self::AlterIndexVisibility { name, visible } => {
                let visibility = if *visible { "VISIBLE" } else { "INVISIBLE" };
                format!("ALTER INDEX `{name}` {visibility}")
            }
            Self::AddForeignKey { fk, rename_only } => {
                if *rename_only && !mods.strict_foreign_key_naming {
                    String::new()
                } else {
                    render_add_foreign_key(fk)
                }
            }
            Self::DropForeignKey { name, rename_only } => {
                if *rename_only && !mods.strict_foreign_key_naming {
                    String::new()
                } else {
                    format!("DROP FOREIGN KEY `{name}`")
                }
            }
            Self::RenameColumn { from, to } => format!("RENAME COLUMN `{from}` TO `{to}`"),
            Self::ChangeCharSet { charset } => format!("DEFAULT CHARACTER SET = {charset}"),
            Self::ChangeCollation { collation, .. } => format!("DEFAULT COLLATE = {collation}"),
            Self::ChangeComment { comment } => match comment {
                Some(comment) => format!("COMMENT = '{}'", escape_sql_string(comment)),
                None => "COMMENT = ''".to_string(),
            },
            Self::ChangeEngine { engine } => format!("ENGINE = {engine}"),
            Self::ChangeAutoIncrement { new, .. } => render_auto_increment(mods, *new),
            Self::ChangeRowFormat { row_format } => match row_format {
                Some(format) => format!("ROW_FORMAT = {format}"),
                None => "ROW_FORMAT = DEFAULT".to_string(),
            },
            Self::ChangeCreateOptions { create_options } => {
                create_options.clone().unwrap_or_default()
            }
            Self::AddPartitioning { .. } | Self::RemovePartitioning { .. } => {
                if matches!(mods.partitioning, crate::modifiers::PartitioningMode::Remove) {
                    String::new()
                } else {
                    render_partitioning_clause(self)
                }
            }
            Self::ModifyPartitions { .. } => String::new(),
        }
    }
}

fn render_position(position: &Option<ColumnPosition>) -> String {
    position.as_ref().map(ColumnPosition::render).unwrap_or_default()
}

fn render_column_def(column: &Column) -> String {
    let mut out = format!("`{}` {}", column.name, column.sql_type);
    if let Some(charset) = &column.charset {
        out.push_str(&format!(" CHARACTER SET {charset}"));
    }
    if let Some(collation) = &column.collation {
        out.push_str(&format!(" COLLATE {collation}"));
    }
    if let Some(generated) = &column.generated {
        let mode = match generated.mode {
            crate::model::GeneratedMode::Virtual => "VIRTUAL",
            crate::model::GeneratedMode::Stored => "STORED",
        };
        out.push_str(&format!(" GENERATED ALWAYS AS ({}) {mode}", generated.expression));
    } else {
        out.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        match &column.default {
            crate::model::ColumnDefault::None => {}
            crate::model::ColumnDefault::Null => out.push_str(" DEFAULT NULL"),
            crate::model::ColumnDefault::Literal(value) => {
                out.push_str(&format!(" DEFAULT '{}'", escape_sql_string(value)));
            }
            crate::model::ColumnDefault::Expression(expr) => {
                out.push_str(&format!(" DEFAULT ({expr})"));
            }
        }
        if column.auto_increment {
            out.push_str(" AUTO_INCREMENT");
        }
        if let Some(on_update) = &column.on_update {
            out.push_str(&format!(" ON UPDATE {on_update}"));
        }
    }
    if let Some(comment) = &column.comment {
        out.push_str(&format!(" COMMENT '{}'", escape_sql_string(comment)));
    }
    out
}

fn render_add_index(index: &IndexDef) -> String {
    if index.name == "PRIMARY" {
        return format!("ADD PRIMARY KEY ({})", render_index_parts(index));
    }
    let unique = if index.unique { "UNIQUE " } else { "" };
    let kind = match index.index_type {
        crate::model::IndexType::BTree => "INDEX",
        crate::model::IndexType::FullText => "FULLTEXT INDEX",
        crate::model::IndexType::Spatial => "SPATIAL INDEX",
        crate::model::IndexType::Hash => "INDEX",
    };
    let using = matches!(index.index_type, crate::model::IndexType::Hash)
        .then_some(" USING HASH")
        .unwrap_or_default();
    let mut out = format!("ADD {unique}{kind} `{}` ({}){using}", index.name, render_index_parts(index));
    if !index.visible {
        out.push_str(" INVISIBLE");
    }
    if let Some(comment) = &index.comment {
        out.push_str(&format!(" COMMENT '{}'", escape_sql_string(comment)));
    }
    out
}

fn render_drop_index(name: &str) -> String {
    if name == "PRIMARY" {
        "DROP PRIMARY KEY".to_string()
    } else {
        format!("DROP INDEX `{name}`")
    }
}

fn render_index_parts(index: &IndexDef) -> String {
    index
        .parts
        .iter()
        .map(|part| match part {
            crate::model::IndexPart::Column { name, prefix_length: Some(length) } => {
                format!("`{name}`({length})")
            }
            crate::model::IndexPart::Column { name, prefix_length: None } => format!("`{name}`"),
            crate::model::IndexPart::Expression(expr) => format!("({expr})"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_add_foreign_key(fk: &ForeignKey) -> String {
    let local = fk.columns.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ");
    let referenced = fk.referenced_columns.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ");
    let qualified_table = match &fk.referenced_schema {
        Some(schema) => format!("`{schema}`.`{}`", fk.referenced_table),
        None => format!("`{}`", fk.referenced_table),
    };
    format!(
        "ADD CONSTRAINT `{}` FOREIGN KEY ({local}) REFERENCES {qualified_table} ({referenced}) ON UPDATE {} ON DELETE {}",
        fk.name,
        fk.on_update.as_sql(),
        fk.on_delete.as_sql(),
    )
}

fn render_auto_increment(mods: &StatementModifiers, new: u64) -> String {
    use crate::modifiers::NextAutoIncMode;
    match mods.next_auto_inc {
        NextAutoIncMode::Ignore => String::new(),
        _ => format!("AUTO_INCREMENT = {new}"),
    }
}

fn render_partitioning_clause(clause: &AlterClause) -> String {
    match clause {
        AlterClause::AddPartitioning { partitioning } => {
            format!("PARTITION BY {}", render_partitioning(partitioning))
        }
        AlterClause::RemovePartitioning => "REMOVE PARTITIONING".to_string(),
        _ => String::new(),
    }
}

pub(crate) fn render_partitioning(partitioning: &Partitioning) -> String {
    use crate::model::PartitionMethod;
    let method = match partitioning.method {
        PartitionMethod::Range { .. } => "RANGE",
        PartitionMethod::List { .. } => "LIST",
        PartitionMethod::Hash { linear: false } => "HASH",
        PartitionMethod::Hash { linear: true } => "LINEAR HASH",
        PartitionMethod::Key { linear: false } => "KEY",
        PartitionMethod::Key { linear: true } => "LINEAR KEY",
    };
    let mut out = format!("{method} ({})", partitioning.expression);
    if !partitioning.partitions.is_empty() {
        let parts = partitioning
            .partitions
            .iter()
            .map(render_partition_def)
            .collect::<Vec<_>>()
            .join(",\n  ");
        out.push_str(&format!(" (\n  {parts}\n)"));
    }
    out
}

fn render_partition_def(def: &crate::model::PartitionDef) -> String {
    let mut out = format!("PARTITION `{}`", def.name);
    match &def.bound {
        crate::model::PartitionBound::LessThan(value) => out.push_str(&format!(" VALUES LESS THAN ({value})")),
        crate::model::PartitionBound::LessThanMaxValue => out.push_str(" VALUES LESS THAN MAXVALUE"),
        crate::model::PartitionBound::InValues(values) => {
            out.push_str(&format!(" VALUES IN ({})", values.join(", ")));
        }
        crate::model::PartitionBound::None => {}
    }
    if let Some(engine) = &def.engine {
        out.push_str(&format!(" ENGINE = {engine}"));
    }
    if let Some(comment) = &def.comment {
        out.push_str(&format!(" COMMENT = '{}'", escape_sql_string(comment)));
    }
    out
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}
