//! Renders a [`Table`] back into the `CREATE TABLE` text MySQL itself would
//! hand back from `SHOW CREATE TABLE`. This is the inverse of [`crate::parser`]
//! and is what populates `Table::canonical_create`, which the core crate's
//! differ and `Table::is_supported` compare against the observed text.

use tabletree_core::model::{
    Column, ColumnDefault, ForeignKey, GeneratedMode, IndexDef, IndexPart, IndexType, PartitionBound, PartitionDef,
    PartitionMethod, Partitioning, Table,
};

pub fn render_create(table: &Table) -> String {
    let mut lines = Vec::new();

    for column in &table.columns {
        lines.push(format!("  {}", render_column_def(column)));
    }
    if let Some(pk) = &table.primary_key {
        lines.push(format!("  PRIMARY KEY ({})", render_index_parts(pk)));
    }
    for index in &table.secondary_indexes {
        lines.push(format!("  {}", render_index_def(index)));
    }
    for fk in &table.foreign_keys {
        lines.push(format!("  {}", render_foreign_key_def(fk)));
    }

    let mut out = format!("CREATE TABLE `{}` (\n{}\n)", table.name, lines.join(",\n"));
    out.push_str(&format!(" ENGINE={}", table.engine));
    if table.next_auto_increment > 1 {
        out.push_str(&format!(" AUTO_INCREMENT={}", table.next_auto_increment));
    }
    out.push_str(&format!(" DEFAULT CHARSET={}", table.charset));
    if !table.collation_is_default {
        out.push_str(&format!(" COLLATE={}", table.collation));
    }
    if let Some(row_format) = &table.row_format {
        out.push_str(&format!(" ROW_FORMAT={row_format}"));
    }
    if let Some(options) = &table.create_options {
        out.push(' ');
        out.push_str(options);
    }
    if let Some(comment) = &table.comment {
        out.push_str(&format!(" COMMENT='{}'", escape_sql_string(comment)));
    }
    if let Some(partitioning) = &table.partitioning {
        out.push_str(&format!("\n{}", render_partitioning_clause(partitioning)));
    }
    out
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
            GeneratedMode::Virtual => "VIRTUAL",
            GeneratedMode::Stored => "STORED",
        };
        out.push_str(&format!(" GENERATED ALWAYS AS ({}) {mode}", generated.expression));
        out.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    } else {
        if !column.nullable {
            out.push_str(" NOT NULL");
        }
        match &column.default {
            ColumnDefault::None => {}
            ColumnDefault::Null => out.push_str(" DEFAULT NULL"),
            ColumnDefault::Literal(value) => {
                out.push_str(&format!(" DEFAULT '{}'", escape_sql_string(value)));
            }
            ColumnDefault::Expression(expr) => out.push_str(&format!(" DEFAULT {expr}")),
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

fn render_index_def(index: &IndexDef) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let kind = match index.index_type {
        IndexType::BTree | IndexType::Hash => "KEY",
        IndexType::FullText => "FULLTEXT KEY",
        IndexType::Spatial => "SPATIAL KEY",
    };
    let using = matches!(index.index_type, IndexType::Hash).then_some(" USING HASH").unwrap_or_default();
    let mut out = format!("{unique}{kind} `{}` ({}){using}", index.name, render_index_parts(index));
    if !index.visible {
        out.push_str(" /*!80000 INVISIBLE */");
    }
    if let Some(comment) = &index.comment {
        out.push_str(&format!(" COMMENT '{}'", escape_sql_string(comment)));
    }
    out
}

fn render_index_parts(index: &IndexDef) -> String {
    index
        .parts
        .iter()
        .map(|part| match part {
            IndexPart::Column { name, prefix_length: Some(length) } => format!("`{name}`({length})"),
            IndexPart::Column { name, prefix_length: None } => format!("`{name}`"),
            IndexPart::Expression(expr) => format!("({expr})"),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn render_foreign_key_def(fk: &ForeignKey) -> String {
    let local = fk.columns.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(",");
    let referenced = fk.referenced_columns.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(",");
    let qualified_table = match &fk.referenced_schema {
        Some(schema) => format!("`{schema}`.`{}`", fk.referenced_table),
        None => format!("`{}`", fk.referenced_table),
    };
    format!(
        "CONSTRAINT `{}` FOREIGN KEY ({local}) REFERENCES {qualified_table} ({referenced}) ON DELETE {} ON UPDATE {}",
        fk.name,
        fk.on_delete.as_sql(),
        fk.on_update.as_sql(),
    )
}

fn render_partitioning_clause(partitioning: &Partitioning) -> String {
    let method = match partitioning.method {
        PartitionMethod::Range { .. } => "RANGE",
        PartitionMethod::List { .. } => "LIST",
        PartitionMethod::Hash { linear: false } => "HASH",
        PartitionMethod::Hash { linear: true } => "LINEAR HASH",
        PartitionMethod::Key { linear: false } => "KEY",
        PartitionMethod::Key { linear: true } => "LINEAR KEY",
    };
    let mut out = format!("/*!50100 PARTITION BY {method} ({})", partitioning.expression);
    if !partitioning.partitions.is_empty() {
        let parts = partitioning.partitions.iter().map(render_partition_def).collect::<Vec<_>>().join(",\n ");
        out.push_str(&format!("\n({parts})"));
    }
    out.push_str(" */");
    out
}

fn render_partition_def(def: &PartitionDef) -> String {
    let mut out = format!(" PARTITION `{}`", def.name);
    match &def.bound {
        PartitionBound::LessThan(value) => out.push_str(&format!(" VALUES LESS THAN ({value})")),
        PartitionBound::LessThanMaxValue => out.push_str(" VALUES LESS THAN MAXVALUE"),
        PartitionBound::InValues(values) => out.push_str(&format!(" VALUES IN ({})", values.join(","))),
        PartitionBound::None => {}
    }
    if let Some(engine) = &def.engine {
        out.push_str(&format!(" ENGINE = {engine}"));
    }
    out
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletree_core::model::Column;

    #[test]
    fn renders_single_column_table_with_primary_key() {
        let mut table = Table::new("widgets");
        let mut id = Column::new("id", "int");
        id.nullable = false;
        id.auto_increment = true;
        table.columns.push(id);
        table.primary_key = Some(IndexDef::new("PRIMARY", vec![IndexPart::column("id")]));

        let create = render_create(&table);
        assert!(create.starts_with("CREATE TABLE `widgets` (\n  `id` int NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n)"));
        assert!(create.contains("ENGINE=InnoDB"));
        assert!(create.contains("DEFAULT CHARSET=utf8mb4"));
    }

    #[test]
    fn omits_auto_increment_clause_when_at_one() {
        let table = Table::new("widgets");
        assert!(!render_create(&table).contains("AUTO_INCREMENT="));
    }
}
