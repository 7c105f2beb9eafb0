use crate::config::{ConnectionConfig, TargetConfig};
use crate::model::Schema;

/// One schema on one instance, paired with the schema state a directory
/// wants it to converge to (spec §4.6). `desired` is `None` for a schema
/// the directory wants to not exist at all.
#[derive(Debug, Clone)]
pub struct Target {
    pub instance: ConnectionConfig,
    pub schema_name: String,
    pub directory: String,
    pub desired: Option<Schema>,
    pub config: TargetConfig,
}

/// A set of `Target`s sharing one instance. The coordinator hands a whole
/// group to a single worker and drains it there, so two targets on the same
/// instance are never handled concurrently by two different workers (spec
/// §3, §4.6, §5, §9).
#[derive(Debug, Clone)]
pub struct TargetGroup {
    pub directory: String,
    pub targets: Vec<Target>,
}

/// Whatever expands option files and host lists into concrete targets (the
/// out-of-scope directory walker + option-file parser, spec §1/§6) need only
/// implement this to drive the coordinator.
pub trait TargetSource: Send {
    fn next_group(&mut self) -> Option<TargetGroup>;
}

/// A `TargetSource` built directly from an in-memory list, for callers (and
/// tests) that already have concrete targets rather than a directory tree
/// to walk.
pub struct StaticTargetSource {
    groups: std::vec::IntoIter<TargetGroup>,
}

impl StaticTargetSource {
    #[must_use]
    pub fn new(groups: Vec<TargetGroup>) -> Self {
        Self { groups: groups.into_iter() }
    }
}

impl TargetSource for StaticTargetSource {
    fn next_group(&mut self) -> Option<TargetGroup> {
        self.groups.next()
    }
}
