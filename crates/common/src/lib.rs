//! Shared types for the interceptor components
//!
//! The command model, the root-relative path rewriting and the per-tool
//! argument analysers live here so that the preload shim, the driver and the
//! offline dump tool all agree on what an intercepted command looks like.

pub mod analysis;
pub mod command;
pub mod relpath;

pub use analysis::{analyze_command, AnalysisResult, Analyzer};
pub use command::{parse_environment, Command, EnvMap};

/// Environment variables used to hand control data from the driver to the
/// shim. The driver writes them before spawning the build; every child only
/// ever reads them.
pub const ENV_ROOT_DIRECTORY: &str = "INTERCEPTOR_root_directory";
pub const ENV_COMMAND_LOG: &str = "INTERCEPTOR_command_log";

/// The dynamic loader's preload hook, set by the driver for every child.
pub const ENV_PRELOAD: &str = "LD_PRELOAD";

/// Overrides the driver's default root directory (its own cwd).
pub const ENV_ROOT_DIR_OVERRIDE: &str = "ROOT_DIR";

/// File name of the preload library, expected next to the driver executable.
pub const SHIM_LIBRARY_NAME: &str = "libinterceptor_shim.so";
