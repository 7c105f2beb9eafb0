use std::sync::mpsc;
use std::sync::Mutex;

use crate::connection::Connection;
use crate::ddl;
use crate::diff::{diff_schemas, TableDiff};
use crate::error::{Error, Result};
use crate::model::{Schema, Table};
use crate::modifiers::StatementModifiers;
use crate::verify;

use super::output::TargetReport;
use super::target::{Target, TargetGroup, TargetSource};

/// Counters the coordinator accumulates across every target, behind one
/// lock (spec §5's "one lock" concurrency design).
#[derive(Debug, Default)]
pub struct CoordinatorState {
    pub diff_count: u64,
    pub unsupported_count: u64,
    pub error_count: u64,
    pub fatal_error: Option<String>,
}

/// Opens a live connection for one target. Implemented by the dialect crate;
/// the coordinator itself never constructs a `mysql` connection.
pub trait Connector: Send + Sync {
    fn connect(&self, target: &Target) -> Result<Box<dyn Connection>>;

    /// Reads the current state of `schema_name` off `connection`. The
    /// default reads each table's `SHOW CREATE TABLE` text verbatim into
    /// both `observed_create` and `canonical_create` with no structural
    /// fields populated, which is only correct when the differ never needs
    /// to look past the text (the two equal, or the table is being created
    /// fresh). A dialect crate that owns a `.sql` parser should override
    /// this to parse each table's DDL into real `columns`/indexes/`foreign_keys`
    /// (spec §1's "paper-thin introspection": one query per table, fed
    /// through the same parser `.sql` files go through).
    fn introspect(&self, connection: &mut dyn Connection, schema_name: &str) -> Result<Option<Schema>> {
        introspect_text_only(connection, schema_name)
    }
}

/// Default `Connector::introspect`: observed text only, no structural
/// decomposition. See the trait method's doc comment.
fn introspect_text_only(connection: &mut dyn Connection, schema_name: &str) -> Result<Option<Schema>> {
    if !connection.schema_exists(schema_name)? {
        return Ok(None);
    }
    let mut schema = Schema::new(schema_name, "utf8mb4", "utf8mb4_0900_ai_ci");
    for table_name in connection.table_names()? {
        if let Some(create_text) = connection.show_create_table(&table_name)? {
            let mut table = Table::new(&table_name);
            table.observed_create = Some(create_text.clone());
            table.canonical_create = create_text;
            schema.add_table(table);
        }
    }
    Ok(Some(schema))
}

/// Drives reconciliation for every target a `TargetSource` yields, fanning
/// work out across `concurrency` worker threads (spec §4.6, §5). A fatal
/// error (verification failure, bad config) stops workers from picking up
/// further targets, but in-flight targets finish.
pub fn run(mut source: impl TargetSource, connector: &dyn Connector, concurrency: usize) -> (CoordinatorState, Vec<TargetReport>) {
    let concurrency = concurrency.max(1);

    let mut groups = Vec::new();
    while let Some(group) = source.next_group() {
        groups.push(group);
    }

    let state = Mutex::new(CoordinatorState::default());
    let reports = Mutex::new(Vec::with_capacity(groups.iter().map(|g| g.targets.len()).sum()));

    let (sender, receiver) = mpsc::channel::<TargetGroup>();
    for group in groups {
        sender.send(group).expect("receiver kept alive for the duration of the scope below");
    }
    drop(sender);
    let receiver = Mutex::new(receiver);

    std::thread::scope(|scope| {
        for _ in 0..concurrency {
            let receiver = &receiver;
            let state = &state;
            let reports = &reports;
            scope.spawn(move || worker_loop(receiver, connector, state, reports));
        }
    });

    let state = state.into_inner().expect("coordinator mutex poisoned");
    let reports = reports.into_inner().expect("coordinator mutex poisoned");
    (state, reports)
}

/// Pulls one whole `TargetGroup` at a time and drains it here, sequentially,
/// before asking for the next — that's what keeps every target on a shared
/// instance on a single worker (spec §3, §4.6, §5, §9).
fn worker_loop(
    receiver: &Mutex<mpsc::Receiver<TargetGroup>>,
    connector: &dyn Connector,
    state: &Mutex<CoordinatorState>,
    reports: &Mutex<Vec<TargetReport>>,
) {
    loop {
        let group = {
            let receiver = receiver.lock().expect("coordinator mutex poisoned");
            receiver.recv()
        };
        let Ok(group) = group else { break };

        for target in &group.targets {
            if state.lock().expect("coordinator mutex poisoned").fatal_error.is_some() {
                return;
            }

            let report = process_target(connector, target, state);
            reports.lock().expect("coordinator mutex poisoned").push(report);
        }
    }
}

fn process_target(connector: &dyn Connector, target: &Target, state: &Mutex<CoordinatorState>) -> TargetReport {
    let mut report =
        TargetReport { directory: target.directory.clone(), schema_name: target.schema_name.clone(), ..TargetReport::default() };

    let mut connection = match connector.connect(target) {
        Ok(connection) => connection,
        Err(err) => return fail(state, &mut report, err),
    };

    if let Err(err) = connection.use_schema(&target.schema_name) {
        return fail(state, &mut report, err);
    }

    let current = match connector.introspect(connection.as_mut(), &target.schema_name) {
        Ok(schema) => schema,
        Err(err) => return fail(state, &mut report, err),
    };

    let schema_diff = diff_schemas(
        current.as_ref(),
        target.desired.as_ref(),
        (&target.config.default_charset, &target.config.default_collation),
    );

    state.lock().expect("coordinator mutex poisoned").unsupported_count += schema_diff.unsupported_tables.len() as u64;
    report.unsupported_tables = schema_diff.unsupported_tables.into_iter().collect();

    let mods = build_modifiers(target);

    for table_diff in &schema_diff.table_diffs {
        if target.config.verify
            && let Err(err) = verify::verify_alter(
                connection.as_mut(),
                &target.config.temp_schema,
                target.config.reuse_temp_schema,
                table_diff,
                mods.flavor,
            )
        {
            return fail(state, &mut report, err);
        }

        let table_size = if target.config.alter_wrapper.is_some() || target.config.ddl_wrapper.is_some() {
            match connection.table_size_bytes(table_diff.table_name()) {
                Ok(size) => size,
                Err(err) => return fail(state, &mut report, err),
            }
        } else {
            0
        };

        let mut stmt_mods = mods.clone();
        let wrapper_template = select_wrapper(target, table_diff, table_size, &mut stmt_mods);

        match ddl::statement(table_diff, &stmt_mods) {
            Ok(text) if text.is_empty() => {}
            Ok(text) => {
                state.lock().expect("coordinator mutex poisoned").diff_count += 1;
                if target.config.dry_run {
                    let skipped = match wrapper_template {
                        Some(template) => {
                            match render_wrapper_display(target, table_diff, &text, table_size, &stmt_mods, template) {
                                Ok(display) => display,
                                Err(err) => return fail(state, &mut report, err),
                            }
                        }
                        None => text,
                    };
                    report.skipped.push(skipped);
                } else if let Some(template) = wrapper_template {
                    if let Err(err) = run_wrapper(target, table_diff, &text, table_size, &stmt_mods, template) {
                        return fail(state, &mut report, err);
                    }
                    report.statements.push(text);
                } else if let Err(err) = connection.execute(&text) {
                    return fail(state, &mut report, err);
                } else {
                    report.statements.push(text);
                }
            }
            Err(err) => {
                mark_error(state, &err);
                report.skipped.push(format!("{}: {err}", table_diff.table_name()));
            }
        }

        if target.config.first_only {
            break;
        }
    }

    report
}

/// Picks the wrapper template for one table diff and, when the alter-wrapper
/// applies, clears `LockClause`/`AlgorithmClause` from `mods` before the
/// caller renders DDL text (spec §4.4: external OSC tools manage their own
/// locking). `alter-wrapper` only ever applies to `Alter` diffs at or above
/// `alter-wrapper-min-size`; `ddl-wrapper` is the fallback for anything else.
fn select_wrapper<'a>(
    target: &'a Target,
    table_diff: &TableDiff,
    table_size: u64,
    mods: &mut StatementModifiers,
) -> Option<&'a str> {
    if matches!(table_diff, TableDiff::Alter { .. })
        && let Some(template) = target.config.alter_wrapper.as_deref()
        && table_size >= target.config.alter_wrapper_min_size
    {
        mods.lock_clause = None;
        mods.algorithm_clause = None;
        return Some(template);
    }
    target.config.ddl_wrapper.as_deref()
}

fn wrapper_context(
    target: &Target,
    table_diff: &TableDiff,
    ddl_text: &str,
    table_size: u64,
    mods: &StatementModifiers,
) -> ddl::WrapperContext {
    let dirname = std::path::Path::new(&target.directory)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.directory.clone());

    let type_label = match table_diff {
        TableDiff::Create { .. } => "CREATE",
        TableDiff::Drop { .. } => "DROP",
        TableDiff::Alter { .. } => "ALTER",
    };

    let clauses = match table_diff {
        TableDiff::Alter { clauses, .. } => {
            clauses.iter().map(|clause| clause.render(mods)).filter(|fragment| !fragment.is_empty()).collect::<Vec<_>>().join(", ")
        }
        TableDiff::Create { .. } | TableDiff::Drop { .. } => String::new(),
    };

    ddl::WrapperContext {
        ddl: Some(ddl_text.to_string()),
        table: Some(table_diff.table_name().to_string()),
        schema: Some(target.schema_name.clone()),
        r#type: Some(type_label.to_string()),
        size: Some(table_size.to_string()),
        clauses: Some(clauses),
        host: target.instance.host.clone(),
        port: target.instance.port.map(|port| port.to_string()),
        socket: target.instance.socket.clone(),
        user: target.instance.user.clone(),
        password: target.instance.password.clone(),
        password_masked: target.instance.password.as_ref().map(|password| "*".repeat(password.chars().count())),
        connect_options: target.instance.connect_options.clone(),
        dirname: Some(dirname),
        dirpath: Some(target.directory.clone()),
        environment: None,
    }
}

fn render_wrapper_display(
    target: &Target,
    table_diff: &TableDiff,
    ddl_text: &str,
    table_size: u64,
    mods: &StatementModifiers,
    template: &str,
) -> Result<String> {
    let context = wrapper_context(target, table_diff, ddl_text, table_size, mods);
    ddl::wrap(template, &context)
}

/// Runs a `host-wrapper`/`ddl-wrapper` command to completion (spec §4.4): no
/// shell is invoked, the template is word-split into an argv and each token's
/// placeholders substituted directly (see `ddl::wrap_argv`).
fn run_wrapper(
    target: &Target,
    table_diff: &TableDiff,
    ddl_text: &str,
    table_size: u64,
    mods: &StatementModifiers,
    template: &str,
) -> Result<()> {
    let context = wrapper_context(target, table_diff, ddl_text, table_size, mods);
    let argv = ddl::wrap_argv(template, &context)?;
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::execution(template, std::io::Error::other("wrapper template has no command")));
    };

    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .map_err(|source| Error::execution(template, source))?;
    if !status.success() {
        return Err(Error::execution(template, std::io::Error::other(format!("wrapper command exited with {status}"))));
    }
    Ok(())
}

fn fail(state: &Mutex<CoordinatorState>, report: &mut TargetReport, err: Error) -> TargetReport {
    mark_error(state, &err);
    report.error = Some(err.to_string());
    report.clone()
}

fn build_modifiers(target: &Target) -> StatementModifiers {
    StatementModifiers {
        allow_unsafe: target.config.allow_drop_table || target.config.allow_drop_column,
        lock_clause: target.config.alter_lock.clone(),
        algorithm_clause: target.config.alter_algorithm.clone(),
        ignore_table: target.config.ignore_table.as_deref().and_then(|pattern| regex::Regex::new(pattern).ok()),
        flavor: target.config.flavor,
        ..StatementModifiers::default()
    }
}

fn mark_error(state: &Mutex<CoordinatorState>, err: &Error) {
    let mut state = state.lock().expect("coordinator mutex poisoned");
    state.error_count += 1;
    if err.is_fatal() {
        state.fatal_error.get_or_insert_with(|| err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, TargetConfig};
    use crate::push::target::{StaticTargetSource, TargetGroup};
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeConnection {
        tables: HashMap<String, String>,
        executed: Vec<String>,
    }

    impl Connection for FakeConnection {
        fn show_create_table(&mut self, table: &str) -> Result<Option<String>> {
            Ok(self.tables.get(table).cloned())
        }
        fn table_names(&mut self) -> Result<Vec<String>> {
            Ok(self.tables.keys().cloned().collect())
        }
        fn execute(&mut self, sql: &str) -> Result<()> {
            self.executed.push(sql.to_string());
            Ok(())
        }
        fn get_lock(&mut self, _name: &str, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }
        fn release_lock(&mut self, _name: &str) -> Result<()> {
            Ok(())
        }
        fn schema_exists(&mut self, _schema: &str) -> Result<bool> {
            Ok(true)
        }
        fn create_schema(&mut self, _schema: &str, _charset: &str, _collation: &str) -> Result<()> {
            Ok(())
        }
        fn drop_schema(&mut self, _schema: &str) -> Result<()> {
            Ok(())
        }
        fn use_schema(&mut self, _schema: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FakeConnector;
    impl Connector for FakeConnector {
        fn connect(&self, _target: &Target) -> Result<Box<dyn Connection>> {
            Ok(Box::new(FakeConnection::default()))
        }
    }

    fn test_target(directory: &str) -> Target {
        let mut to = Table::new("t1");
        to.canonical_create = "CREATE TABLE `t1` (`id` int)".to_string();
        let mut desired = Schema::new("app", "utf8mb4", "utf8mb4_0900_ai_ci");
        desired.add_table(to);

        Target {
            instance: ConnectionConfig {
                host: Some("localhost".to_string()),
                port: Some(3306),
                user: None,
                password: None,
                database: "app".to_string(),
                socket: None,
                connect_options: None,
                extra: std::collections::BTreeMap::new(),
            },
            schema_name: "app".to_string(),
            directory: directory.to_string(),
            desired: Some(desired),
            config: TargetConfig { verify: false, ..TargetConfig::default() },
        }
    }

    #[test]
    fn creates_new_table_against_empty_schema() {
        let source = StaticTargetSource::new(vec![TargetGroup {
            directory: "schemas/app".to_string(),
            targets: vec![test_target("schemas/app")],
        }]);

        let (state, reports) = run(source, &FakeConnector, 2);
        assert_eq!(state.error_count, 0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].statements.len(), 1);
        assert!(reports[0].statements[0].contains("CREATE TABLE"));
    }

    #[test]
    fn dry_run_records_statement_as_skipped_not_executed() {
        let mut target = test_target("schemas/app");
        target.config.dry_run = true;
        let source =
            StaticTargetSource::new(vec![TargetGroup { directory: "schemas/app".to_string(), targets: vec![target] }]);

        let (_, reports) = run(source, &FakeConnector, 1);
        assert!(reports[0].statements.is_empty());
        assert_eq!(reports[0].skipped.len(), 1);
    }
}
