//! Parses `.sql` text into [`Table`] values.
//!
//! `sqlparser` validates that each statement is syntactically a MySQL
//! `CREATE TABLE` before we touch it; the actual column/index/foreign-key
//! extraction walks the statement text directly, the same way the trailing
//! table options (`ENGINE=`, `PARTITION BY ...`) are picked up, since those
//! never round-trip cleanly through a dialect-generic AST.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::{dialect::MySqlDialect, parser::Parser};
use tabletree_core::model::{
    Column, ColumnDefault, ForeignKey, ForeignKeyAction, GeneratedColumn, GeneratedMode, IndexDef, IndexPart,
    IndexType, Table,
};
use tabletree_core::{Error, Result};

use crate::to_sql::render_create;

pub fn parse_sql(sql: &str) -> Result<Vec<Table>> {
    let mut tables = Vec::new();
    for (start, end) in split_statement_spans(sql) {
        let Some(statement_sql) = sql.get(start..end).map(str::trim) else { continue };
        if statement_sql.is_empty() {
            continue;
        }

        Parser::parse_sql(&MySqlDialect {}, statement_sql)
            .map_err(|source| Error::target_construction_with_source(format!("failed to parse: {statement_sql}"), source))?;

        if let Some(table) = parse_create_table(statement_sql)? {
            tables.push(table);
        }
    }
    Ok(tables)
}

fn parse_create_table(statement_sql: &str) -> Result<Option<Table>> {
    let upper = statement_sql.to_ascii_uppercase();
    if !upper.trim_start().starts_with("CREATE TABLE") && !upper.trim_start().starts_with("CREATE TEMPORARY TABLE") {
        return Ok(None);
    }

    let name = parse_table_name(statement_sql)
        .ok_or_else(|| Error::target_construction(format!("failed to parse CREATE TABLE name: {statement_sql}")))?;

    let open = statement_sql.find('(').ok_or_else(|| {
        Error::target_construction(format!("CREATE TABLE `{name}` is missing a column list"))
    })?;
    let close = matching_paren(statement_sql, open).ok_or_else(|| {
        Error::target_construction(format!("CREATE TABLE `{name}` has an unbalanced column list"))
    })?;
    let body = &statement_sql[open + 1..close];
    let trailer = &statement_sql[close + 1..];

    let mut table = Table::new(&name);
    for fragment in split_top_level(body) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        apply_definition(&mut table, fragment);
    }
    apply_table_options(&mut table, trailer);

    table.observed_create = Some(statement_sql.trim().trim_end_matches(';').to_string());
    table.canonical_create = render_create(&table);
    Ok(Some(table))
}

fn apply_definition(table: &mut Table, fragment: &str) {
    let upper = fragment.to_ascii_uppercase();

    if upper.starts_with("PRIMARY KEY") {
        if let Some(open) = fragment.find('(') {
            if let Some(close) = matching_paren(fragment, open) {
                table.primary_key = Some(IndexDef::new("PRIMARY", parse_column_list(&fragment[open..=close])));
            }
        }
    } else if upper.starts_with("CONSTRAINT") || upper.contains("FOREIGN KEY") {
        if let Some(fk) = parse_foreign_key(fragment) {
            table.foreign_keys.push(fk);
        }
    } else if upper.starts_with("UNIQUE KEY") || upper.starts_with("UNIQUE INDEX") || upper.starts_with("UNIQUE ") {
        if let Some(index) = parse_index(fragment, true, IndexType::BTree) {
            table.secondary_indexes.push(index);
        }
    } else if upper.starts_with("FULLTEXT") {
        if let Some(index) = parse_index(fragment, false, IndexType::FullText) {
            table.secondary_indexes.push(index);
        }
    } else if upper.starts_with("SPATIAL") {
        if let Some(index) = parse_index(fragment, false, IndexType::Spatial) {
            table.secondary_indexes.push(index);
        }
    } else if upper.starts_with("KEY") || upper.starts_with("INDEX") {
        if let Some(index) = parse_index(fragment, false, IndexType::BTree) {
            table.secondary_indexes.push(index);
        }
    } else if upper.starts_with("CHECK") {
        // Non-goal: CHECK constraints are not part of the schema model.
    } else if let Some(column) = parse_column(fragment) {
        table.columns.push(column);
    }
}

fn parse_column(fragment: &str) -> Option<Column> {
    let trimmed = fragment.trim_start();
    let leading_ws = fragment.len() - trimmed.len();
    let (name, ident_end) = if let Some(rest) = trimmed.strip_prefix('`') {
        let close = rest.find('`')?;
        (rest[..close].to_string(), leading_ws + 1 + close + 1)
    } else {
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        (trimmed[..end].to_string(), leading_ws + end)
    };
    let rest = fragment[ident_end..].trim();

    static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i)[A-Z0-9_]+(\([^)]*\))?(\s+(UNSIGNED|ZEROFILL))*").unwrap());
    let type_match = TYPE_RE.find(rest)?;
    let sql_type = type_match.as_str().trim().to_string();
    let modifiers = rest[type_match.end()..].trim();

    let mut column = Column::new(name, sql_type);
    apply_column_modifiers(&mut column, modifiers);
    Some(column)
}

fn apply_column_modifiers(column: &mut Column, modifiers: &str) {
    let upper = modifiers.to_ascii_uppercase();

    column.nullable = !upper.contains("NOT NULL");

    static GENERATED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)GENERATED ALWAYS AS \((.*?)\)\s*(VIRTUAL|STORED)?").unwrap());
    if let Some(caps) = GENERATED_RE.captures(modifiers) {
        let mode = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(m) if m == "STORED" => GeneratedMode::Stored,
            _ => GeneratedMode::Virtual,
        };
        column.generated = Some(GeneratedColumn { expression: caps[1].trim().to_string(), mode });
    }

    static DEFAULT_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)DEFAULT\s+'((?:[^']|'')*)'").unwrap());
    static DEFAULT_EXPR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)DEFAULT\s+\(([^)]*)\)").unwrap());
    static DEFAULT_BARE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)DEFAULT\s+([A-Za-z0-9_.]+(?:\([^)]*\))?)").unwrap());
    if let Some(caps) = DEFAULT_LITERAL_RE.captures(modifiers) {
        column.default = ColumnDefault::Literal(caps[1].replace("''", "'"));
    } else if let Some(caps) = DEFAULT_EXPR_RE.captures(modifiers) {
        column.default = ColumnDefault::Expression(caps[1].trim().to_string());
    } else if let Some(caps) = DEFAULT_BARE_RE.captures(modifiers) {
        let value = caps[1].trim();
        column.default = if value.eq_ignore_ascii_case("NULL") {
            ColumnDefault::Null
        } else {
            ColumnDefault::Expression(value.to_string())
        };
    }

    column.auto_increment = upper.contains("AUTO_INCREMENT");

    static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)COMMENT\s+'((?:[^']|'')*)'").unwrap());
    if let Some(caps) = COMMENT_RE.captures(modifiers) {
        column.comment = Some(caps[1].replace("''", "'"));
    }

    static COLLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)COLLATE\s+([A-Za-z0-9_]+)").unwrap());
    if let Some(caps) = COLLATE_RE.captures(modifiers) {
        column.collation = Some(caps[1].to_string());
    }

    static CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)CHARACTER SET\s+([A-Za-z0-9_]+)").unwrap());
    if let Some(caps) = CHARSET_RE.captures(modifiers) {
        column.charset = Some(caps[1].to_string());
    }

    static ON_UPDATE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)ON UPDATE\s+([A-Za-z0-9_().]+)").unwrap());
    if let Some(caps) = ON_UPDATE_RE.captures(modifiers) {
        column.on_update = Some(caps[1].to_string());
    }
}

fn parse_index(fragment: &str, unique: bool, index_type: IndexType) -> Option<IndexDef> {
    let open = fragment.find('(')?;
    let close = matching_paren(fragment, open)?;
    let header = fragment[..open].trim();
    let name = header.split_whitespace().last().map(strip_backticks).unwrap_or_else(|| "idx".to_string());
    let mut index = IndexDef::new(name, parse_column_list(&fragment[open..=close]));
    index.unique = unique;
    index.index_type = index_type;
    Some(index)
}

fn parse_foreign_key(fragment: &str) -> Option<ForeignKey> {
    static FK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?is)(?:CONSTRAINT\s+`?(?P<name>[A-Za-z0-9_]+)`?\s+)?FOREIGN KEY\s*\((?P<cols>[^)]*)\)\s*REFERENCES\s+`?(?P<rtable>[A-Za-z0-9_]+)`?\s*\((?P<rcols>[^)]*)\)(?P<rest>.*)",
        )
        .unwrap()
    });
    let caps = FK_RE.captures(fragment)?;
    let columns = split_top_level(&caps["cols"]).iter().map(|c| strip_backticks(c.trim())).collect::<Vec<_>>();
    let referenced_columns = split_top_level(&caps["rcols"]).iter().map(|c| strip_backticks(c.trim())).collect::<Vec<_>>();
    let name = caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_else(|| {
        format!("fk_{}_{}", caps["rtable"].to_ascii_lowercase(), columns.join("_"))
    });

    let rest = caps["rest"].to_ascii_uppercase();
    Some(ForeignKey {
        name,
        columns,
        referenced_schema: None,
        referenced_table: caps["rtable"].to_string(),
        referenced_columns,
        on_delete: extract_fk_action(&rest, "ON DELETE"),
        on_update: extract_fk_action(&rest, "ON UPDATE"),
    })
}

fn extract_fk_action(upper_rest: &str, marker: &str) -> ForeignKeyAction {
    let Some(position) = upper_rest.find(marker) else { return ForeignKeyAction::Restrict };
    let after = upper_rest[position + marker.len()..].trim_start();
    if after.starts_with("CASCADE") {
        ForeignKeyAction::Cascade
    } else if after.starts_with("SET NULL") {
        ForeignKeyAction::SetNull
    } else if after.starts_with("SET DEFAULT") {
        ForeignKeyAction::SetDefault
    } else if after.starts_with("NO ACTION") {
        ForeignKeyAction::NoAction
    } else {
        ForeignKeyAction::Restrict
    }
}

fn parse_column_list(parenthesized: &str) -> Vec<IndexPart> {
    let trimmed = parenthesized.trim().trim_start_matches('(').trim_end_matches(')');
    split_top_level(trimmed)
        .iter()
        .map(|part| {
            let part = part.trim();
            if let Some(open) = part.find('(') {
                let name = strip_backticks(part[..open].trim());
                let length = part[open + 1..].trim_end_matches(')').trim().parse::<u32>().ok();
                IndexPart::Column { name, prefix_length: length }
            } else {
                IndexPart::column(strip_backticks(part))
            }
        })
        .collect()
}

fn apply_table_options(table: &mut Table, trailer: &str) {
    static ENGINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ENGINE\s*=\s*([A-Za-z0-9_]+)").unwrap());
    static CHARSET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(?:DEFAULT\s+)?CHARSET\s*=\s*([A-Za-z0-9_]+)").unwrap());
    static COLLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)COLLATE\s*=\s*([A-Za-z0-9_]+)").unwrap());
    static AUTO_INC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)AUTO_INCREMENT\s*=\s*(\d+)").unwrap());
    static ROW_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ROW_FORMAT\s*=\s*([A-Za-z0-9_]+)").unwrap());
    static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)COMMENT\s*=\s*'((?:[^']|'')*)'").unwrap());
    static PARTITION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)PARTITION BY.*$").unwrap());

    if let Some(caps) = ENGINE_RE.captures(trailer) {
        table.engine = caps[1].to_string();
    }
    if let Some(caps) = CHARSET_RE.captures(trailer) {
        table.charset = caps[1].to_string();
    }
    if let Some(caps) = COLLATE_RE.captures(trailer) {
        table.collation = caps[1].to_string();
        table.collation_is_default = false;
    }
    if let Some(caps) = AUTO_INC_RE.captures(trailer) {
        table.next_auto_increment = caps[1].parse().unwrap_or(1);
    }
    if let Some(caps) = ROW_FORMAT_RE.captures(trailer) {
        table.row_format = Some(caps[1].to_string());
    }
    if let Some(caps) = COMMENT_RE.captures(trailer) {
        table.comment = Some(caps[1].replace("''", "'"));
    }
    if PARTITION_RE.is_match(trailer) {
        // Partition bodies vary too much across MySQL/MariaDB to decompose
        // reliably; tabletree treats an existing partitioning clause as
        // present-but-opaque and only tracks add/remove, not its shape.
        table.partitioning = None;
    }
}

fn parse_table_name(statement_sql: &str) -> Option<String> {
    let tokens: Vec<&str> = statement_sql.split_whitespace().collect();
    let mut cursor = 0;
    if !tokens.first()?.eq_ignore_ascii_case("CREATE") {
        return None;
    }
    cursor += 1;
    if tokens.get(cursor)?.eq_ignore_ascii_case("TEMPORARY") {
        cursor += 1;
    }
    if !tokens.get(cursor)?.eq_ignore_ascii_case("TABLE") {
        return None;
    }
    cursor += 1;
    if tokens.get(cursor)?.eq_ignore_ascii_case("IF")
        && tokens.get(cursor + 1)?.eq_ignore_ascii_case("NOT")
        && tokens.get(cursor + 2)?.eq_ignore_ascii_case("EXISTS")
    {
        cursor += 3;
    }
    let raw = tokens.get(cursor)?.trim_end_matches('(');
    let name = raw.rsplit('.').next().unwrap_or(raw);
    Some(strip_backticks(name))
}

fn strip_backticks(token: &str) -> String {
    token.trim().trim_matches('`').replace("``", "`")
}

/// Matching close paren for the open paren at `open`, respecting string
/// quoting so a literal containing `)` does not confuse the scan.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_quote: Option<u8> = None;
    let mut index = open;
    while index < bytes.len() {
        let byte = bytes[index];
        if let Some(quote) = in_quote {
            if byte == quote {
                in_quote = None;
            }
        } else {
            match byte {
                b'\'' | b'"' | b'`' => in_quote = Some(byte),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
        index += 1;
    }
    None
}

/// Splits `text` on top-level commas, i.e. commas not nested inside
/// parens or quotes. Used for both column-definition lists and
/// comma-separated column-name lists inside index/FK parens.
fn split_top_level(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote: Option<u8> = None;
    let mut start = 0usize;
    let mut index = 0usize;
    while index < bytes.len() {
        let byte = bytes[index];
        if let Some(quote) = in_quote {
            if byte == quote {
                in_quote = None;
            }
        } else {
            match byte {
                b'\'' | b'"' | b'`' => in_quote = Some(byte),
                b'(' => depth += 1,
                b')' => depth -= 1,
                b',' if depth == 0 => {
                    parts.push(text[start..index].to_string());
                    start = index + 1;
                }
                _ => {}
            }
        }
        index += 1;
    }
    if start < bytes.len() {
        parts.push(text[start..].to_string());
    }
    parts
}

/// Byte-level statement splitter respecting quotes, bracket identifiers and
/// comments, so a `;` inside a string literal does not split a statement.
fn split_statement_spans(sql: &str) -> Vec<(usize, usize)> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_backtick_quote = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while index < bytes.len() {
        let byte = bytes[index];

        if in_line_comment {
            if byte == b'\n' {
                in_line_comment = false;
            }
            index += 1;
            continue;
        }
        if in_block_comment {
            if byte == b'*' && bytes.get(index + 1) == Some(&b'/') {
                in_block_comment = false;
                index += 2;
                continue;
            }
            index += 1;
            continue;
        }
        if in_single_quote {
            if byte == b'\\' {
                index = (index + 2).min(bytes.len());
                continue;
            }
            if byte == b'\'' {
                if bytes.get(index + 1) == Some(&b'\'') {
                    index += 2;
                    continue;
                }
                in_single_quote = false;
            }
            index += 1;
            continue;
        }
        if in_double_quote {
            if byte == b'"' {
                if bytes.get(index + 1) == Some(&b'"') {
                    index += 2;
                    continue;
                }
                in_double_quote = false;
            }
            index += 1;
            continue;
        }
        if in_backtick_quote {
            if byte == b'`' {
                if bytes.get(index + 1) == Some(&b'`') {
                    index += 2;
                    continue;
                }
                in_backtick_quote = false;
            }
            index += 1;
            continue;
        }

        if byte == b'-' && bytes.get(index + 1) == Some(&b'-') {
            in_line_comment = true;
            index += 2;
            continue;
        }
        if byte == b'/' && bytes.get(index + 1) == Some(&b'*') {
            in_block_comment = true;
            index += 2;
            continue;
        }

        match byte {
            b'\'' => in_single_quote = true,
            b'"' => in_double_quote = true,
            b'`' => in_backtick_quote = true,
            b';' => {
                spans.push((start, index + 1));
                start = index + 1;
            }
            _ => {}
        }
        index += 1;
    }

    if start < bytes.len() {
        spans.push((start, bytes.len()));
    }
    if spans.is_empty() && !sql.trim().is_empty() {
        spans.push((0, bytes.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_table() {
        let sql = "CREATE TABLE `widgets` (\n  `id` int NOT NULL AUTO_INCREMENT,\n  `name` varchar(191) DEFAULT NULL,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let tables = parse_sql(sql).expect("parses");
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.name, "widgets");
        assert_eq!(table.columns.len(), 2);
        assert!(table.columns[0].auto_increment);
        assert!(!table.columns[0].nullable);
        assert!(table.columns[1].nullable);
        assert_eq!(table.primary_key.as_ref().unwrap().parts, vec![IndexPart::column("id")]);
        assert_eq!(table.engine, "InnoDB");
    }

    #[test]
    fn parses_foreign_key_with_actions() {
        let sql = "CREATE TABLE `orders` (\n  `id` int NOT NULL,\n  `customer_id` int NOT NULL,\n  PRIMARY KEY (`id`),\n  CONSTRAINT `fk_customer` FOREIGN KEY (`customer_id`) REFERENCES `customers` (`id`) ON DELETE CASCADE ON UPDATE RESTRICT\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let tables = parse_sql(sql).expect("parses");
        let fk = &tables[0].foreign_keys[0];
        assert_eq!(fk.referenced_table, "customers");
        assert_eq!(fk.on_delete, ForeignKeyAction::Cascade);
        assert_eq!(fk.on_update, ForeignKeyAction::Restrict);
    }

    #[test]
    fn splits_multiple_statements() {
        let sql = "CREATE TABLE `a` (`id` int); CREATE TABLE `b` (`id` int);";
        let tables = parse_sql(sql).expect("parses");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "a");
        assert_eq!(tables[1].name, "b");
    }
}
