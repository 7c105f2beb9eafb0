mod config;
mod connection;
mod ddl;
mod diff;
mod error;
mod modifiers;
pub mod model;
pub mod push;
mod verify;

pub use config::{ConnectionConfig, TargetConfig, Version};
pub use connection::Connection;
pub use ddl::{wrap, WrapperContext};
pub use diff::{diff_schemas, order_creates, order_table_diffs, AlterClause, ColumnPosition, SchemaDiff, TableDiff};
pub use error::{Error, Result};
pub use modifiers::{Flavor, NextAutoIncMode, PartitioningMode, StatementModifiers};
pub use verify::verify_alter;

pub use ddl::statement as ddl_statement;
