mod error_presentation;

use std::fs;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::Parser;
use error_presentation::{render_runtime_error, CliError, CliResult};
use tabletree_core::model::Schema;
use tabletree_core::push::{Connector, StaticTargetSource, Target, TargetGroup};
use tabletree_core::{Connection, ConnectionConfig, Result as CoreResult, TargetConfig};

/// Reconciles one MySQL schema toward the tables described by a `.sql` file
/// or directory of `.sql` files.
#[derive(Parser)]
#[command(name = "tabletree", version, about)]
struct Cli {
    /// Schema (database) name to reconcile.
    schema: String,

    /// Path to a `.sql` file, or a directory of `.sql` files, describing the
    /// desired tables. Reads from stdin when omitted.
    #[arg(long)]
    dir: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    socket: Option<String>,

    /// Print the statements that would run without executing them.
    #[arg(long)]
    dry_run: bool,
    /// Permit DROP TABLE.
    #[arg(long)]
    allow_drop_table: bool,
    /// Permit DROP COLUMN.
    #[arg(long)]
    allow_drop_column: bool,
    /// Skip the sandboxed ALTER replay before applying each statement.
    #[arg(long)]
    no_verify: bool,
    /// Apply only the first pending statement per table.
    #[arg(long)]
    first_only: bool,
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    #[arg(long)]
    alter_lock: Option<String>,
    #[arg(long)]
    alter_algorithm: Option<String>,
    /// Regex of table names to leave untouched.
    #[arg(long)]
    ignore_table: Option<String>,
}

struct MysqlConnector;

impl Connector for MysqlConnector {
    fn connect(&self, target: &Target) -> CoreResult<Box<dyn Connection>> {
        let connection = tabletree_mysql::connect(&target.instance)?;
        Ok(Box::new(connection))
    }

    fn introspect(&self, connection: &mut dyn Connection, schema_name: &str) -> CoreResult<Option<Schema>> {
        tabletree_mysql::introspect_schema(connection, schema_name)
    }
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(error) => {
            let exit_code = error.exit_code();
            eprintln!("{}", render_runtime_error(error));
            std::process::exit(exit_code);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let desired_sql = read_desired_sql(cli.dir.as_deref())?;
    let tables = tabletree_mysql::parse_sql(&desired_sql)?;

    let mut desired = Schema::new(&cli.schema, "utf8mb4", "utf8mb4_0900_ai_ci");
    for table in tables {
        desired.add_table(table);
    }

    let instance = ConnectionConfig {
        host: Some(cli.host.clone()),
        port: cli.port,
        user: cli.user.clone(),
        password: cli.password.clone(),
        database: cli.schema.clone(),
        socket: cli.socket.clone(),
        connect_options: None,
        extra: Default::default(),
    };

    let flavor = tabletree_mysql::connect(&instance)?.flavor();

    let mut config = TargetConfig { flavor, ..TargetConfig::default() };
    config.dry_run = cli.dry_run;
    config.allow_drop_table = cli.allow_drop_table;
    config.allow_drop_column = cli.allow_drop_column;
    config.verify = !cli.no_verify;
    config.first_only = cli.first_only;
    config.alter_lock = cli.alter_lock.clone();
    config.alter_algorithm = cli.alter_algorithm.clone();
    config.ignore_table = cli.ignore_table.clone();
    config.validate()?;

    let directory = cli.dir.as_ref().map(|path| path.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());

    let target =
        Target { instance, schema_name: cli.schema.clone(), directory: directory.clone(), desired: Some(desired), config };

    let source = StaticTargetSource::new(vec![TargetGroup { directory, targets: vec![target] }]);
    let (state, reports) = tabletree_core::push::run(source, &MysqlConnector, cli.concurrency.max(1));

    for report in &reports {
        print!("{}", report.render());
    }

    if let Some(fatal) = state.fatal_error {
        return Err(CliError::Fatal(fatal));
    }
    Ok(reconciliation_exit_code(&state, cli.dry_run))
}

/// Maps the coordinator's tallies to the documented exit codes (spec
/// §4.6/§6): any recovered per-statement failure or unsupported table takes
/// priority over a clean dry-run report, since it means the run did not do
/// everything the desired schema asked for.
fn reconciliation_exit_code(state: &tabletree_core::push::CoordinatorState, dry_run: bool) -> i32 {
    use error_presentation::{EXIT_DIFFERENCES_FOUND, EXIT_PARTIAL_ERROR, EXIT_SUCCESS};

    if state.error_count > 0 || state.unsupported_count > 0 {
        EXIT_PARTIAL_ERROR
    } else if dry_run && state.diff_count > 0 {
        EXIT_DIFFERENCES_FOUND
    } else {
        EXIT_SUCCESS
    }
}

fn read_desired_sql(dir: Option<&Path>) -> CliResult<String> {
    match dir {
        Some(path) if path.is_dir() => read_sql_directory(path),
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::ReadFile { path: path.to_path_buf(), source }),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).map_err(CliError::ReadStdin)?;
            if buffer.trim().is_empty() {
                return Err(CliError::MissingDesiredSchemaInput);
            }
            Ok(buffer)
        }
    }
}

fn read_sql_directory(path: &Path) -> CliResult<String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)
        .map_err(|source| CliError::ReadFile { path: path.to_path_buf(), source })?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|extension| extension == "sql"))
        .collect();
    entries.sort();

    if entries.is_empty() {
        return Err(CliError::MissingDesiredSchemaInput);
    }

    let mut combined = String::new();
    for entry in entries {
        let text = fs::read_to_string(&entry).map_err(|source| CliError::ReadFile { path: entry.clone(), source })?;
        combined.push_str(&text);
        combined.push('\n');
    }
    Ok(combined)
}
