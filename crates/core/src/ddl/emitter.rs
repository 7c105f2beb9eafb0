use regex::Regex;
use std::sync::LazyLock;

use crate::diff::{AlterClause, TableDiff};
use crate::error::{Error, Result};
use crate::modifiers::{NextAutoIncMode, PartitioningMode, StatementModifiers};

static AUTO_INCREMENT_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*AUTO_INCREMENT\s*=\s*\d+").expect("valid regex"));
static PARTITION_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\s*/\*!50100 PARTITION BY.*\*/\s*\z|\s*PARTITION BY.*\z").expect("valid regex"));

/// Turns a table diff plus statement modifiers into a final DDL string, or
/// an error, or an empty string for a no-op (spec §4.3).
pub fn statement(diff: &TableDiff, mods: &StatementModifiers) -> Result<String> {
    if mods.ignores_table(diff.table_name()) {
        return Ok(String::new());
    }

    match diff {
        TableDiff::Create { to } => Ok(render_create(&to.canonical_create, to.next_auto_increment, mods)),
        TableDiff::Drop { from } => {
            if mods.allow_unsafe {
                Ok(format!("DROP TABLE `{}`", from.name))
            } else {
                Err(Error::ForbiddenDiff { table: from.name.clone(), clause: "DROP TABLE".to_string() })
            }
        }
        TableDiff::Alter { from, to, clauses: _, supported: false } => Err(Error::UnsupportedDiff {
            table: to.name.clone(),
            expected_create: to.canonical_create.clone(),
            actual_create: from.observed_create.clone().unwrap_or_else(|| from.canonical_create.clone()),
        }),
        TableDiff::Alter { to, clauses, supported: true, .. } => render_alter(&to.name, clauses, mods),
    }
}

fn render_create(canonical_create: &str, next_auto_increment: u64, mods: &StatementModifiers) -> String {
    let mut text = canonical_create.to_string();

    let keep_auto_increment = matches!(mods.next_auto_inc, NextAutoIncMode::IfIncreased | NextAutoIncMode::Always)
        && next_auto_increment > 1;
    if !keep_auto_increment {
        text = AUTO_INCREMENT_CLAUSE.replace(&text, "").into_owned();
    }

    if matches!(mods.partitioning, PartitioningMode::Remove) {
        text = PARTITION_TRAILER.replace(&text, "").into_owned();
    }

    text
}

fn render_alter(table_name: &str, clauses: &[AlterClause], mods: &StatementModifiers) -> Result<String> {
    if let [only_clause] = clauses
        && only_clause.is_change_auto_increment()
        && !auto_increment_policy_keeps(only_clause, mods)
    {
        return Ok(String::new());
    }

    let fragments: Vec<String> =
        clauses.iter().map(|clause| clause.render(mods)).filter(|fragment| !fragment.is_empty()).collect();

    if fragments.is_empty() {
        return Ok(String::new());
    }

    if !mods.allow_unsafe
        && let Some(unsafe_clause) = clauses.iter().find(|c| c.is_unsafe())
    {
        return Err(Error::ForbiddenDiff {
            table: table_name.to_string(),
            clause: unsafe_clause.render(mods),
        });
    }

    let mut preamble = Vec::new();
    if let Some(algorithm) = &mods.algorithm_clause {
        preamble.push(format!("ALGORITHM={}", algorithm.to_ascii_uppercase()));
    }
    if let Some(lock) = &mods.lock_clause {
        preamble.push(format!("LOCK={}", lock.to_ascii_uppercase()));
    }

    let mut parts = preamble;
    parts.extend(fragments);

    Ok(format!("ALTER TABLE `{table_name}` {}", parts.join(", ")))
}

fn auto_increment_policy_keeps(clause: &AlterClause, mods: &StatementModifiers) -> bool {
    let AlterClause::ChangeAutoIncrement { old, new } = clause else {
        return true;
    };
    match mods.next_auto_inc {
        NextAutoIncMode::Ignore => false,
        NextAutoIncMode::IfIncreased => new > old,
        NextAutoIncMode::IfAlready => *old > 1,
        NextAutoIncMode::Always => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Table};
    use crate::modifiers::Flavor;

    fn forbid_mods() -> StatementModifiers {
        StatementModifiers::default()
    }

    fn allow_mods() -> StatementModifiers {
        StatementModifiers { allow_unsafe: true, ..StatementModifiers::default() }
    }

    #[test]
    fn drop_is_forbidden_without_allow_unsafe() {
        let mut table = Table::new("t1");
        table.canonical_create = "CREATE TABLE `t1` (`id` int)".to_string();
        let diff = TableDiff::Drop { from: table.clone() };

        let err = statement(&diff, &forbid_mods()).unwrap_err();
        assert!(matches!(err, Error::ForbiddenDiff { .. }));

        let text = statement(&diff, &allow_mods()).unwrap();
        assert_eq!(text, "DROP TABLE `t1`");
    }

    #[test]
    fn empty_alter_is_noop() {
        let from = Table::new("t1");
        let to = from.clone();
        let diff = TableDiff::Alter { from, to, clauses: Vec::new(), supported: true };
        assert_eq!(statement(&diff, &forbid_mods()).unwrap(), "");
    }

    #[test]
    fn add_column_with_lock_and_algorithm_prefix() {
        let mut from = Table::new("t1");
        let mut to = from.clone();
        let column = Column::new("something", "smallint(5) unsigned");
        to.columns.push(column.clone());
        from.canonical_create = "a".to_string();
        to.canonical_create = "b".to_string();

        let clauses = vec![AlterClause::AddColumn { column, position: None }];
        let diff = TableDiff::Alter { from, to, clauses, supported: true };

        let mods = StatementModifiers {
            lock_clause: Some("none".to_string()),
            algorithm_clause: Some("online".to_string()),
            ..StatementModifiers::default()
        };

        let text = statement(&diff, &mods).unwrap();
        assert_eq!(
            text,
            "ALTER TABLE `t1` ALGORITHM=ONLINE, LOCK=NONE, ADD COLUMN `something` smallint(5) unsigned DEFAULT NULL"
        );
    }

    #[test]
    fn create_strips_auto_increment_by_default() {
        let mut table = Table::new("t1");
        table.next_auto_increment = 5;
        table.canonical_create = "CREATE TABLE `t1` (`id` int) ENGINE=InnoDB AUTO_INCREMENT=5 DEFAULT CHARSET=utf8mb4".to_string();
        let diff = TableDiff::Create { to: table };

        let text = statement(&diff, &forbid_mods()).unwrap();
        assert!(!text.contains("AUTO_INCREMENT"));
    }

    #[test]
    fn create_with_auto_increment_of_one_never_shows_clause() {
        let mut table = Table::new("t1");
        table.next_auto_increment = 1;
        table.canonical_create = "CREATE TABLE `t1` (`id` int) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4".to_string();
        let diff = TableDiff::Create { to: table };

        let mods = StatementModifiers { next_auto_inc: NextAutoIncMode::Always, ..StatementModifiers::default() };
        let text = statement(&diff, &mods).unwrap();
        assert!(!text.contains("AUTO_INCREMENT"));
    }

    #[test]
    fn next_auto_inc_matrix() {
        let case = |old: u64, new: u64, mode: NextAutoIncMode| -> bool {
            let clause = AlterClause::ChangeAutoIncrement { old, new };
            let mods = StatementModifiers { next_auto_inc: mode, ..StatementModifiers::default() };
            auto_increment_policy_keeps(&clause, &mods)
        };
        assert!(case(1, 4, NextAutoIncMode::IfIncreased));
        assert!(!case(4, 1, NextAutoIncMode::IfIncreased));
        assert!(!case(1, 4, NextAutoIncMode::IfAlready));
        assert!(case(2, 4, NextAutoIncMode::IfAlready));
        assert!(case(4, 2, NextAutoIncMode::Always));
    }

    #[test]
    fn unsupported_flavor_marker_unused_here() {
        let _ = Flavor::Mysql80;
    }
}
