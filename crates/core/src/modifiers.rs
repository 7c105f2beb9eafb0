use regex::Regex;

/// Controls when `AUTO_INCREMENT=` is emitted for a table (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAutoIncMode {
    Ignore,
    IfIncreased,
    IfAlready,
    Always,
}

/// Controls whether partition clauses are emitted at all (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitioningMode {
    Keep,
    Remove,
}

/// Target database flavor; affects a handful of rendering decisions (spec
/// §3, §4.5's `AlgorithmClause="COPY"` note for pre-5.7 servers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Mysql57,
    Mysql80,
    MariaDb,
}

impl Flavor {
    #[must_use]
    pub const fn supports_instant_algorithm(self) -> bool {
        matches!(self, Self::Mysql80)
    }
}

/// A per-statement policy record (spec §3). Cheap to clone and to override
/// per-target in the push coordinator (spec §4.6).
#[derive(Debug, Clone)]
pub struct StatementModifiers {
    pub allow_unsafe: bool,
    pub next_auto_inc: NextAutoIncMode,
    pub lock_clause: Option<String>,
    pub algorithm_clause: Option<String>,
    pub strict_index_order: bool,
    pub strict_foreign_key_naming: bool,
    pub partitioning: PartitioningMode,
    pub ignore_table: Option<Regex>,
    pub flavor: Flavor,
}

impl Default for StatementModifiers {
    fn default() -> Self {
        Self {
            allow_unsafe: false,
            next_auto_inc: NextAutoIncMode::Ignore,
            lock_clause: None,
            algorithm_clause: None,
            strict_index_order: false,
            strict_foreign_key_naming: false,
            partitioning: PartitioningMode::Keep,
            ignore_table: None,
            flavor: Flavor::Mysql80,
        }
    }
}

impl StatementModifiers {
    #[must_use]
    pub fn ignores_table(&self, table_name: &str) -> bool {
        self.ignore_table.as_ref().is_some_and(|re| re.is_match(table_name))
    }

    /// The modifiers the verifier uses when replaying ALTERs in the temp
    /// schema (spec §4.5): agnostic to reorderings and safe destructive ops,
    /// since the sandbox replay is strictly about catching malformed DDL,
    /// not re-litigating policy the operator already approved.
    #[must_use]
    pub fn for_verification(flavor: Flavor) -> Self {
        Self {
            allow_unsafe: true,
            next_auto_inc: NextAutoIncMode::Ignore,
            lock_clause: None,
            algorithm_clause: if flavor.supports_instant_algorithm() {
                None
            } else {
                Some("COPY".to_string())
            },
            strict_index_order: true,
            strict_foreign_key_naming: true,
            partitioning: PartitioningMode::Keep,
            ignore_table: None,
            flavor,
        }
    }
}
