/// A column's default value, tagged so "no default" and "explicit NULL default"
/// remain distinguishable through diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDefault {
    None,
    Null,
    Literal(String),
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedMode {
    Virtual,
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedColumn {
    pub expression: String,
    pub mode: GeneratedMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: ColumnDefault,
    pub auto_increment: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub on_update: Option<String>,
    pub generated: Option<GeneratedColumn>,
    pub comment: Option<String>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default: ColumnDefault::None,
            auto_increment: false,
            charset: None,
            collation: None,
            on_update: None,
            generated: None,
            comment: None,
        }
    }

    /// Columns are identified by name across a diff; this is the identity
    /// the table differ pairs on (no rename detection in the core, per spec).
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
