mod alter_clause;
mod ordering;
mod schema_differ;
mod table_diff;
mod table_differ;

pub use alter_clause::{AlterClause, ColumnPosition};
pub use ordering::{order_creates, order_table_diffs};
pub use schema_differ::diff_schemas;
pub use table_diff::{SchemaDiff, TableDiff};
pub use table_differ::diff;
