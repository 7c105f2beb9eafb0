use super::{Column, ForeignKey, IndexDef, Partitioning};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub engine: String,
    pub charset: String,
    pub collation: String,
    pub collation_is_default: bool,
    pub columns: Vec<Column>,
    pub primary_key: Option<IndexDef>,
    pub secondary_indexes: Vec<IndexDef>,
    pub foreign_keys: Vec<ForeignKey>,
    pub partitioning: Option<Partitioning>,
    pub next_auto_increment: u64,
    pub row_format: Option<String>,
    pub create_options: Option<String>,
    pub comment: Option<String>,
    /// Canonical `CREATE TABLE` text derived from the fields above, rendered
    /// by the dialect crate at construction time.
    pub canonical_create: String,
    /// `CREATE TABLE` text as actually read from the database, if this table
    /// came from introspection or a `.sql` file rather than being authored
    /// purely in memory (e.g. as the `to` side of a not-yet-existing table).
    pub observed_create: Option<String>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: "InnoDB".to_string(),
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_0900_ai_ci".to_string(),
            collation_is_default: true,
            columns: Vec::new(),
            primary_key: None,
            secondary_indexes: Vec::new(),
            foreign_keys: Vec::new(),
            partitioning: None,
            next_auto_increment: 1,
            row_format: None,
            create_options: None,
            comment: None,
            canonical_create: String::new(),
            observed_create: None,
        }
    }

    /// A table is diff-supported when its observed `CREATE TABLE` text (if
    /// any) matches the text this model would itself generate, modulo
    /// whitespace/ordering normalization performed by the caller before
    /// constructing this value (spec §3 invariant).
    #[must_use]
    pub fn is_supported(&self) -> bool {
        match &self.observed_create {
            Some(observed) => observed == &self.canonical_create,
            None => true,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.secondary_indexes.iter().find(|index| index.name == name)
    }

    #[must_use]
    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name == name)
    }
}
