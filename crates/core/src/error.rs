use std::{error::Error as StdError, fmt};

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Error taxonomy (spec §7). Each kind is handled at a different granularity
/// by callers: forbidden/execution errors are recovered per-statement or
/// per-table, verification/config errors halt the whole run.
#[derive(Debug)]
pub enum Error {
    /// A destructive clause was present without `AllowUnsafe`.
    ForbiddenDiff { table: String, clause: String },
    /// The source table's observed and generated `CREATE TABLE` disagree, so
    /// no statement can be safely synthesized for it.
    UnsupportedDiff {
        table: String,
        expected_create: String,
        actual_create: String,
    },
    /// An undefined `{VAR}` placeholder appeared in a wrapper template.
    WrapperInterpolation { template: String, placeholder: String },
    /// A replayed ALTER did not reproduce the intended `CREATE TABLE`.
    Verification {
        table: String,
        expected_create: String,
        actual_create: String,
    },
    /// Unparseable or out-of-range configuration (bad `alter-algorithm`,
    /// non-positive `concurrent-instances`, etc).
    Config { detail: String },
    /// A target (instance x schema x directory) could not be constructed:
    /// unreadable directory, `.sql` parse error, invalid instance
    /// definition.
    TargetConstruction { detail: String, source: Option<BoxedError> },
    /// A SQL statement failed while being executed against a live instance.
    Execution { sql: String, source: BoxedError },
}

impl Error {
    #[must_use]
    pub fn wrapper_interpolation(template: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::WrapperInterpolation { template: template.into(), placeholder: placeholder.into() }
    }

    #[must_use]
    pub fn execution(sql: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Execution { sql: sql.into(), source: Box::new(source) }
    }

    #[must_use]
    pub fn target_construction(detail: impl Into<String>) -> Self {
        Self::TargetConstruction { detail: detail.into(), source: None }
    }

    #[must_use]
    pub fn target_construction_with_source(
        detail: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::TargetConstruction { detail: detail.into(), source: Some(Box::new(source)) }
    }

    #[must_use]
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config { detail: detail.into() }
    }

    /// The extended diagnostic form spec §4.3/§7 requires for unsupported
    /// diffs and verification failures: expected vs. actual CREATE TABLE
    /// text plus a line-level diff to seed operator diagnosis.
    #[must_use]
    pub fn extended(&self) -> String {
        match self {
            Self::UnsupportedDiff { expected_create, actual_create, .. }
            | Self::Verification { expected_create, actual_create, .. } => {
                format!(
                    "{self}\n--- expected (generated) ---\n{expected_create}\n--- actual (observed) ---\n{actual_create}\n{}",
                    unified_diff(expected_create, actual_create)
                )
            }
            other => other.to_string(),
        }
    }

    /// Whether the run as a whole must halt (spec §7 propagation policy):
    /// verification and configuration errors are fatal, everything else is
    /// recovered at statement/table granularity by the caller.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Verification { .. } | Self::Config { .. })
    }
}

fn unified_diff(expected: &str, actual: &str) -> String {
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let mut out = String::new();
    for line in &expected_lines {
        if !actual_lines.contains(line) {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
    }
    for line in &actual_lines {
        if !expected_lines.contains(line) {
            out.push_str("+ ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForbiddenDiff { table, clause } => {
                write!(f, "forbidden diff on `{table}`: {clause} requires AllowUnsafe")
            }
            Self::UnsupportedDiff { table, .. } => {
                write!(f, "table `{table}` is unsupported for diffing")
            }
            Self::WrapperInterpolation { template, placeholder } => {
                write!(f, "undefined placeholder `{{{placeholder}}}` in wrapper template `{template}`")
            }
            Self::Verification { table, .. } => {
                write!(f, "verification failed for table `{table}`: replayed ALTER did not reproduce target")
            }
            Self::Config { detail } => write!(f, "configuration error: {detail}"),
            Self::TargetConstruction { detail, .. } => write!(f, "target construction error: {detail}"),
            Self::Execution { sql, .. } => write!(f, "execution error running `{sql}`"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::TargetConstruction { source: Some(source), .. } => Some(source.as_ref()),
            Self::Execution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
