use std::time::Duration;

use crate::error::Result;

/// The boundary a dialect crate fills in to give the core engine a live
/// instance to talk to (spec §6). Deliberately narrow: it exposes the raw
/// SQL operations the verifier and push coordinator need, not a full
/// introspection walk — a dialect turns `show_create_table`'s text into a
/// `Table` using the same `.sql`-text parser it uses for file-based sources,
/// so there is exactly one code path from SQL text to the in-memory model.
///
/// A `Connection` always has exactly one schema selected via `use_schema`;
/// `show_create_table`/`table_names` operate against that schema.
pub trait Connection: Send {
    fn show_create_table(&mut self, table: &str) -> Result<Option<String>>;

    fn table_names(&mut self) -> Result<Vec<String>>;

    /// Runs one DDL or DML statement with no expected result set.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// `GET_LOCK(name, timeout)`; `Ok(true)` if acquired.
    fn get_lock(&mut self, name: &str, timeout: Duration) -> Result<bool>;

    /// `RELEASE_LOCK(name)`.
    fn release_lock(&mut self, name: &str) -> Result<()>;

    fn schema_exists(&mut self, schema: &str) -> Result<bool>;

    fn create_schema(&mut self, schema: &str, charset: &str, collation: &str) -> Result<()>;

    fn drop_schema(&mut self, schema: &str) -> Result<()>;

    /// Selects a schema as the connection's working database (`USE \`name\``).
    fn use_schema(&mut self, schema: &str) -> Result<()>;

    /// Approximate on-disk size of `table`, in bytes (spec §4.4's `{SIZE}`
    /// placeholder and the `alter-wrapper-min-size` threshold). The default
    /// of `0` is conservative for a connection with no cheap way to measure
    /// it: it never trips an `alter-wrapper-min-size` threshold above zero.
    fn table_size_bytes(&mut self, table: &str) -> Result<u64> {
        let _ = table;
        Ok(0)
    }
}
