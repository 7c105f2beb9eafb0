use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use mysql::{prelude::Queryable, OptsBuilder, Pool, PooledConn, Row};
use tabletree_core::{ConnectionConfig, Connection, Error, Flavor, Result};

use crate::export_queries;

const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const MINIMUM_MYSQL_MAJOR_VERSION: u16 = 5;
const CONNECT_SQL: &str = "CONNECT mysql";

pub struct MysqlConnection {
    connection: PooledConn,
    flavor: Flavor,
}

pub fn connect(config: &ConnectionConfig) -> Result<MysqlConnection> {
    let mut connection = connect_connection(config)?;
    let version_raw: String = query_scalar(&mut connection, export_queries::SHOW_SERVER_VERSION_QUERY)?;
    let flavor = detect_flavor(&version_raw)?;
    Ok(MysqlConnection { connection, flavor })
}

impl MysqlConnection {
    #[must_use]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl Connection for MysqlConnection {
    fn show_create_table(&mut self, table: &str) -> Result<Option<String>> {
        let escaped = table.replace('`', "``");
        let query = format!("SHOW CREATE TABLE `{escaped}`");
        let row: Option<Row> = self
            .connection
            .query_first(query.as_str())
            .map_err(|source| execution_error(&query, source))?;
        row.map(|row| row_string(&row, 1, &query, "Create Table")).transpose()
    }

    fn table_names(&mut self) -> Result<Vec<String>> {
        let query = export_queries::TABLE_NAMES_QUERY;
        let rows: Vec<Row> = self.connection.query(query).map_err(|source| execution_error(query, source))?;
        let mut names = rows.iter().map(|row| row_string(row, 0, query, "table_name")).collect::<Result<Vec<_>>>()?;
        names.sort_unstable();
        Ok(names)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.connection.query_drop(sql).map_err(|source| execution_error(sql, source))
    }

    fn get_lock(&mut self, name: &str, timeout: Duration) -> Result<bool> {
        let query = "SELECT GET_LOCK(?, ?)";
        let acquired: Option<i64> = self
            .connection
            .exec_first(query, (name, timeout.as_secs()))
            .map_err(|source| execution_error(query, source))?;
        Ok(acquired == Some(1))
    }

    fn release_lock(&mut self, name: &str) -> Result<()> {
        let query = "SELECT RELEASE_LOCK(?)";
        self.connection.exec_drop(query, (name,)).map_err(|source| execution_error(query, source))
    }

    fn schema_exists(&mut self, schema: &str) -> Result<bool> {
        let query = "SELECT SCHEMA_NAME FROM information_schema.schemata WHERE SCHEMA_NAME = ?";
        let found: Option<String> =
            self.connection.exec_first(query, (schema,)).map_err(|source| execution_error(query, source))?;
        Ok(found.is_some())
    }

    fn create_schema(&mut self, schema: &str, charset: &str, collation: &str) -> Result<()> {
        let escaped = schema.replace('`', "``");
        let sql = format!("CREATE DATABASE `{escaped}` DEFAULT CHARACTER SET {charset} DEFAULT COLLATE {collation}");
        self.execute(&sql)
    }

    fn drop_schema(&mut self, schema: &str) -> Result<()> {
        let escaped = schema.replace('`', "``");
        self.execute(&format!("DROP DATABASE `{escaped}`"))
    }

    fn use_schema(&mut self, schema: &str) -> Result<()> {
        let escaped = schema.replace('`', "``");
        self.execute(&format!("USE `{escaped}`"))
    }

    fn table_size_bytes(&mut self, table: &str) -> Result<u64> {
        let query = export_queries::TABLE_SIZE_QUERY;
        let size: Option<u64> =
            self.connection.exec_first(query, (table,)).map_err(|source| execution_error(query, source))?;
        Ok(size.unwrap_or(0))
    }
}

fn connect_connection(config: &ConnectionConfig) -> Result<PooledConn> {
    let mut builder = OptsBuilder::new()
        .ip_or_hostname(config.host.clone().or_else(|| Some(DEFAULT_MYSQL_HOST.to_string())))
        .tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT))
        .user(config.user.clone())
        .pass(config.password.clone())
        .db_name(Some(config.database.clone()));
    if let Some(socket) = &config.socket {
        builder = builder.socket(Some(socket.clone()));
    }

    let pool = Pool::new(builder).map_err(|source| execution_error(CONNECT_SQL, source))?;
    pool.get_conn().map_err(|source| execution_error(CONNECT_SQL, source))
}

fn query_scalar(connection: &mut PooledConn, sql: &str) -> Result<String> {
    connection
        .query_first::<String, _>(sql)
        .map_err(|source| execution_error(sql, source))?
        .ok_or_else(|| execution_error(sql, io::Error::other("query returned no rows")))
}

fn row_string(row: &Row, index: usize, query: &str, label: &str) -> Result<String> {
    row.get::<String, usize>(index)
        .ok_or_else(|| execution_error(query, io::Error::other(format!("missing column `{label}` in query result"))))
}

fn detect_flavor(raw_version: &str) -> Result<Flavor> {
    let lower = raw_version.to_ascii_lowercase();
    if lower.contains("mariadb") {
        return Ok(Flavor::MariaDb);
    }

    let major = parse_version_component(raw_version, 0);
    let minor = parse_version_component(raw_version, 1);
    match major {
        Some(major) if major >= MINIMUM_MYSQL_MAJOR_VERSION => {
            if major >= 8 {
                Ok(Flavor::Mysql80)
            } else if major == 5 && minor.unwrap_or(0) >= 7 {
                Ok(Flavor::Mysql57)
            } else {
                Err(execution_error(
                    export_queries::SHOW_SERVER_VERSION_QUERY,
                    io::Error::other(format!("mysql server version `{raw_version}` is not supported; requires 5.7+")),
                ))
            }
        }
        _ => Err(execution_error(
            export_queries::SHOW_SERVER_VERSION_QUERY,
            io::Error::other(format!("failed to parse mysql server version string: `{raw_version}`")),
        )),
    }
}

fn parse_version_component(raw: &str, position: usize) -> Option<u16> {
    raw.split_whitespace().next()?.split('.').nth(position)?.chars().take_while(|c| c.is_ascii_digit()).collect::<String>().parse().ok()
}

fn execution_error<E>(sql: &str, source: E) -> Error
where
    E: StdError + Send + Sync + 'static,
{
    Error::execution(sql, source)
}
