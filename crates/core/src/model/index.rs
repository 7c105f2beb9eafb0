#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    BTree,
    FullText,
    Spatial,
    Hash,
}

/// One part of an index's column list: a plain column reference, a prefix
/// length on a column, or an expression (functional index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPart {
    Column { name: String, prefix_length: Option<u32> },
    Expression(String),
}

impl IndexPart {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column { name: name.into(), prefix_length: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub index_type: IndexType,
    pub unique: bool,
    pub parts: Vec<IndexPart>,
    pub comment: Option<String>,
    pub visible: bool,
}

impl IndexDef {
    #[must_use]
    pub fn new(name: impl Into<String>, parts: Vec<IndexPart>) -> Self {
        Self {
            name: name.into(),
            index_type: IndexType::BTree,
            unique: false,
            parts,
            comment: None,
            visible: true,
        }
    }

    /// Whether `self` and `other` cover the same columns/prefixes/expressions
    /// in the same order, ignoring name, uniqueness, type and visibility.
    /// Used by the table differ's `StrictIndexOrder` modifier.
    #[must_use]
    pub fn same_parts(&self, other: &Self) -> bool {
        self.parts == other.parts
    }

    #[must_use]
    pub fn same_parts_unordered(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self.parts.iter().all(|part| other.parts.contains(part))
    }
}
