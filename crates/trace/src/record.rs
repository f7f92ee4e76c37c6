use interceptor_common::Command;
use serde::{Deserialize, Serialize};

/// One frame in the streamed command log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Command(Command),
    /// Reserved for future stream metadata; skipped during compaction.
    Meta(Meta),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {}

/// The compacted manifest the driver leaves behind after a build: the root
/// directory all recorded paths are relative to, and every intercepted
/// command in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub root_directory: String,
    #[serde(default)]
    pub commands: Vec<Command>,
}
