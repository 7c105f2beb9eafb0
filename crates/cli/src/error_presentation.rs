use std::{io, path::PathBuf};

use anyhow::Context;
use miette::Report;

const FILE_READ_CONTEXT: &str = "while reading desired schema file";
const STDIN_READ_CONTEXT: &str = "while reading desired schema from stdin";
const CORE_CONTEXT: &str = "while reconciling schema";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

/// Exit-code taxonomy (spec §4.6/§6).
pub(crate) const EXIT_SUCCESS: i32 = 0;
pub(crate) const EXIT_DIFFERENCES_FOUND: i32 = 1;
pub(crate) const EXIT_PARTIAL_ERROR: i32 = 2;
pub(crate) const EXIT_NO_INPUT: i32 = 66;
pub(crate) const EXIT_BAD_CONFIG: i32 = 78;
pub(crate) const EXIT_FATAL: i32 = 128;

#[derive(Debug)]
pub(crate) enum CliError {
    MissingDesiredSchemaInput,
    ReadFile { path: PathBuf, source: io::Error },
    ReadStdin(io::Error),
    Core(tabletree_core::Error),
    /// A fatal error the coordinator surfaced mid-run (verification failure,
    /// bad config) rather than one that stopped the CLI before `push::run`.
    Fatal(String),
}

impl From<tabletree_core::Error> for CliError {
    fn from(value: tabletree_core::Error) -> Self {
        Self::Core(value)
    }
}

impl CliError {
    /// Maps a halting error to a process exit code (spec §4.6/§6): missing
    /// input and unreadable-input errors are `66`, a rejected configuration
    /// is `78`, everything else that stops the run before or during
    /// reconciliation is `>=128`.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::MissingDesiredSchemaInput | Self::ReadFile { .. } | Self::ReadStdin(_) => EXIT_NO_INPUT,
            Self::Core(tabletree_core::Error::Config { .. }) => EXIT_BAD_CONFIG,
            Self::Core(_) | Self::Fatal(_) => EXIT_FATAL,
        }
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::MissingDesiredSchemaInput => {
            format!("[usage] {}", missing_desired_schema_message())
        }
        CliError::ReadFile { path, source } => {
            let context = format!("{FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::ReadStdin(source) => {
            let report = report_with_context(source, STDIN_READ_CONTEXT);
            format!("[io] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = miette::miette!("{CORE_CONTEXT}\n\n{}", source.extended());
            format!("[{category}] {report}")
        }
        CliError::Fatal(detail) => format!("[fatal] {detail}"),
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source)
        .context(context)
        .expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &tabletree_core::Error) -> &'static str {
    match error {
        tabletree_core::Error::ForbiddenDiff { .. } => "forbidden",
        tabletree_core::Error::UnsupportedDiff { .. } => "unsupported",
        tabletree_core::Error::WrapperInterpolation { .. } => "wrapper",
        tabletree_core::Error::Verification { .. } => "verify",
        tabletree_core::Error::Config { .. } => "config",
        tabletree_core::Error::TargetConstruction { .. } => "target",
        tabletree_core::Error::Execution { .. } => "execute",
    }
}

fn missing_desired_schema_message() -> &'static str {
    "missing desired schema SQL: pass --dir <PATH> or pipe SQL via stdin"
}
