mod coordinator;
mod output;
mod target;

pub use coordinator::{run, CoordinatorState, Connector};
pub use output::TargetReport;
pub use target::{StaticTargetSource, Target, TargetGroup, TargetSource};
