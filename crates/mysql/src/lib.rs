mod adapter;
mod export_queries;
mod introspect;
mod parser;
mod to_sql;

pub use adapter::{connect, MysqlConnection};
pub use introspect::introspect_schema;
pub use parser::parse_sql;
pub use to_sql::render_create;
