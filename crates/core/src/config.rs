use std::collections::BTreeMap;

use crate::modifiers::Flavor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub socket: Option<String>,
    pub connect_options: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// The resolved, already-cascaded configuration for one directory in the
/// filesystem tree (spec §6). This struct is the boundary: whatever parses
/// the hierarchical option files (out of scope for this crate) only needs to
/// fill one of these in per directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub temp_schema: String,
    pub reuse_temp_schema: bool,
    pub default_charset: String,
    pub default_collation: String,
    pub host_wrapper: Option<String>,
    pub alter_wrapper: Option<String>,
    pub alter_wrapper_min_size: u64,
    pub ddl_wrapper: Option<String>,
    pub alter_lock: Option<String>,
    pub alter_algorithm: Option<String>,
    pub allow_drop_table: bool,
    pub allow_drop_column: bool,
    pub safe_below_size: u64,
    pub concurrent_instances: usize,
    pub verify: bool,
    pub dry_run: bool,
    pub first_only: bool,
    pub ignore_schema: Option<String>,
    pub ignore_table: Option<String>,
    pub debug: bool,
    pub flavor: Flavor,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            temp_schema: "_tabletree_tmp".to_string(),
            reuse_temp_schema: false,
            default_charset: "utf8mb4".to_string(),
            default_collation: "utf8mb4_0900_ai_ci".to_string(),
            host_wrapper: None,
            alter_wrapper: None,
            alter_wrapper_min_size: 0,
            ddl_wrapper: None,
            alter_lock: None,
            alter_algorithm: None,
            allow_drop_table: false,
            allow_drop_column: false,
            safe_below_size: 0,
            concurrent_instances: 1,
            verify: true,
            dry_run: false,
            first_only: false,
            ignore_schema: None,
            ignore_table: None,
            debug: false,
            flavor: Flavor::Mysql80,
        }
    }
}

impl TargetConfig {
    /// Validates the subset of fields that can be outright invalid (spec §7
    /// "fatal configuration error"), independent of any particular target.
    pub fn validate(&self) -> crate::Result<()> {
        if self.concurrent_instances == 0 {
            return Err(crate::Error::config("concurrent-instances must be >= 1"));
        }
        if let Some(algorithm) = &self.alter_algorithm
            && !is_known_algorithm(algorithm)
        {
            return Err(crate::Error::config(format!("invalid alter-algorithm `{algorithm}`")));
        }
        if let Some(ignore_table) = &self.ignore_table {
            regex::Regex::new(ignore_table)
                .map_err(|source| crate::Error::config(format!("invalid ignore-table regex: {source}")))?;
        }
        Ok(())
    }
}

fn is_known_algorithm(value: &str) -> bool {
    matches!(
        value.to_ascii_uppercase().as_str(),
        "DEFAULT" | "INPLACE" | "COPY" | "INSTANT"
    )
}
