use std::time::{Duration, Instant};

use crate::connection::Connection;
use crate::ddl;
use crate::diff::TableDiff;
use crate::error::{Error, Result};
use crate::modifiers::{Flavor, StatementModifiers};

/// Per-`GET_LOCK` call timeout, i.e. the retry granularity (spec §4.5 step 1).
const LOCK_POLL_TIMEOUT: Duration = Duration::from_secs(1);
/// Overall wall-clock budget before giving up on the advisory lock (spec §4.5
/// step 1, §5 "bounded by a 30s wall-clock timeout").
const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Replays an `Alter` diff's rendered statement against a scratch copy of
/// the source table and confirms the result actually reproduces the target
/// (spec §4.5). Only `Alter` diffs are checked: a `Create`'s statement *is*
/// its target definition verbatim, and a `Drop` has no "did it work"
/// question beyond the execution itself succeeding.
pub fn verify_alter(
    connection: &mut dyn Connection,
    temp_schema: &str,
    reuse_temp_schema: bool,
    diff: &TableDiff,
    flavor: Flavor,
) -> Result<()> {
    let TableDiff::Alter { from, to, supported: true, .. } = diff else {
        return Ok(());
    };

    let lock_name = format!("tabletree.{temp_schema}");
    acquire_verify_lock(connection, &lock_name)?;

    let result = (|| -> Result<()> {
        ensure_temp_schema(connection, temp_schema, reuse_temp_schema)?;
        connection.use_schema(temp_schema)?;

        let scratch_name = format!("_tabletree_verify_{}", to.name);
        let reference_name = format!("_tabletree_verify_ref_{}", to.name);

        let result = run_verification(&mut *connection, &scratch_name, &reference_name, from, to, diff, flavor);

        let _ = connection.execute(&format!("DROP TABLE IF EXISTS `{scratch_name}`"));
        let _ = connection.execute(&format!("DROP TABLE IF EXISTS `{reference_name}`"));
        if !reuse_temp_schema {
            let _ = connection.drop_schema(temp_schema);
        }

        result
    })();

    // Released on every exit path, success or failure alike (spec §4.5 step 5).
    let _ = connection.release_lock(&lock_name);

    result
}

/// Retries `GET_LOCK` at `LOCK_POLL_TIMEOUT` granularity until acquired or
/// `LOCK_WAIT_TIMEOUT` elapses, then fails fast (spec §4.5 step 1).
fn acquire_verify_lock(connection: &mut dyn Connection, name: &str) -> Result<()> {
    let deadline = Instant::now() + LOCK_WAIT_TIMEOUT;
    loop {
        if connection.get_lock(name, LOCK_POLL_TIMEOUT)? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::config(format!(
                "timed out after {LOCK_WAIT_TIMEOUT:?} waiting for advisory lock `{name}`"
            )));
        }
    }
}

fn run_verification(
    connection: &mut dyn Connection,
    scratch_name: &str,
    reference_name: &str,
    from: &crate::model::Table,
    to: &crate::model::Table,
    diff: &TableDiff,
    flavor: Flavor,
) -> Result<()> {
    connection.execute(&renamed_create(&from.canonical_create, &from.name, scratch_name))?;
    connection.execute(&renamed_create(&to.canonical_create, &to.name, reference_name))?;

    let TableDiff::Alter { clauses, .. } = diff else { unreachable!("caller already matched Alter") };

    let mods = StatementModifiers::for_verification(flavor);
    let mut renamed_to = to.clone();
    renamed_to.name = scratch_name.to_string();
    let scratch_diff =
        TableDiff::Alter { from: from.clone(), to: renamed_to, clauses: clauses.clone(), supported: true };

    let statement = ddl::statement(&scratch_diff, &mods)?;
    if !statement.is_empty() {
        connection.execute(&statement)?;
    }

    let actual = connection
        .show_create_table(scratch_name)?
        .ok_or_else(|| Error::target_construction(format!("scratch table `{scratch_name}` vanished")))?;
    let expected = connection
        .show_create_table(reference_name)?
        .ok_or_else(|| Error::target_construction(format!("reference table `{reference_name}` vanished")))?;

    if normalize(&actual, scratch_name) != normalize(&expected, reference_name) {
        return Err(Error::Verification { table: to.name.clone(), expected_create: expected, actual_create: actual });
    }
    Ok(())
}

fn ensure_temp_schema(connection: &mut dyn Connection, temp_schema: &str, reuse: bool) -> Result<()> {
    if reuse && connection.schema_exists(temp_schema)? {
        return Ok(());
    }
    connection.create_schema(temp_schema, "utf8mb4", "utf8mb4_0900_ai_ci")
}

fn renamed_create(canonical_create: &str, original_name: &str, new_name: &str) -> String {
    canonical_create.replacen(&format!("`{original_name}`"), &format!("`{new_name}`"), 1)
}

/// Normalizes two `SHOW CREATE TABLE` outputs for comparison: replaces the
/// table's own name with a placeholder so the scratch and reference copies
/// (which necessarily have different names) compare equal, and collapses
/// incidental whitespace differences.
fn normalize(create_text: &str, table_name: &str) -> String {
    create_text.replace(&format!("`{table_name}`"), "`_`").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeConnection {
        schemas: HashMap<String, ()>,
        tables: HashMap<(String, String), String>,
        current_schema: String,
    }

    impl Connection for FakeConnection {
        fn show_create_table(&mut self, table: &str) -> Result<Option<String>> {
            Ok(self.tables.get(&(self.current_schema.clone(), table.to_string())).cloned())
        }

        fn table_names(&mut self) -> Result<Vec<String>> {
            let schema = self.current_schema.clone();
            Ok(self.tables.keys().filter(|(s, _)| *s == schema).map(|(_, t)| t.clone()).collect())
        }

        fn execute(&mut self, sql: &str) -> Result<()> {
            let upper = sql.trim_start().to_ascii_uppercase();
            if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
                let name = rest.split('`').nth(1).unwrap().to_string();
                self.tables.insert((self.current_schema.clone(), name), sql.to_string());
            } else if upper.starts_with("ALTER TABLE") {
                let name = sql.split('`').nth(1).unwrap().to_string();
                if let Some(existing) = self.tables.get_mut(&(self.current_schema.clone(), name)) {
                    existing.push_str(" /* altered */");
                }
            }
            Ok(())
        }

        fn get_lock(&mut self, _name: &str, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        fn release_lock(&mut self, _name: &str) -> Result<()> {
            Ok(())
        }

        fn schema_exists(&mut self, schema: &str) -> Result<bool> {
            Ok(self.schemas.contains_key(schema))
        }

        fn create_schema(&mut self, schema: &str, _charset: &str, _collation: &str) -> Result<()> {
            self.schemas.insert(schema.to_string(), ());
            Ok(())
        }

        fn drop_schema(&mut self, schema: &str) -> Result<()> {
            self.schemas.remove(schema);
            Ok(())
        }

        fn use_schema(&mut self, schema: &str) -> Result<()> {
            self.current_schema = schema.to_string();
            Ok(())
        }
    }

    #[test]
    fn normalize_ignores_table_name_and_whitespace() {
        let a = "CREATE TABLE `orders` (\n  `id` int\n)";
        let b = "CREATE TABLE `_tabletree_verify_ref_orders` ( `id` int )";
        assert_eq!(normalize(a, "orders"), normalize(b, "_tabletree_verify_ref_orders"));
    }

    #[test]
    fn create_and_drop_diffs_are_not_verified() {
        let mut connection = FakeConnection::default();
        let table = crate::model::Table::new("t1");
        let create = TableDiff::Create { to: table.clone() };
        let drop = TableDiff::Drop { from: table };
        assert!(verify_alter(&mut connection, "_tt_verify", false, &create, Flavor::Mysql80).is_ok());
        assert!(verify_alter(&mut connection, "_tt_verify", false, &drop, Flavor::Mysql80).is_ok());
    }
}
