mod column;
mod foreign_key;
mod index;
mod partition;
mod schema;
mod table;

pub use column::{Column, ColumnDefault, GeneratedColumn, GeneratedMode};
pub use foreign_key::{ForeignKey, ForeignKeyAction};
pub use index::{IndexDef, IndexPart, IndexType};
pub use partition::{PartitionBound, PartitionDef, PartitionMethod, Partitioning};
pub use schema::Schema;
pub use table::Table;
