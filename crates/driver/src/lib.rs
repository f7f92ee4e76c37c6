//! Driver for intercepted builds.
//!
//! Sets up the preload shim and the control environment variables, spawns
//! the requested build command, and compacts the streamed command log into
//! a single manifest once the build finishes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

use anyhow::{anyhow, ensure, Context, Result};
use tracing::{debug, warn};

use interceptor_common::{
    ENV_COMMAND_LOG, ENV_PRELOAD, ENV_ROOT_DIRECTORY, ENV_ROOT_DIR_OVERRIDE, SHIM_LIBRARY_NAME,
};

pub struct DriverConfig {
    pub shim_library: PathBuf,
    pub root_directory: String,
    pub command_log: Option<PathBuf>,
    pub target_command: Vec<String>,
}

impl DriverConfig {
    pub fn new(target_command: Vec<String>, command_log: Option<PathBuf>) -> Result<Self> {
        ensure!(!target_command.is_empty(), "no build command specified");

        let shim_library = locate_shim_library()?;

        // ROOT_DIR from the environment wins; the driver's cwd is the default
        let root_directory = match env::var(ENV_ROOT_DIR_OVERRIDE) {
            Ok(root) => root,
            Err(_) => env::current_dir()
                .context("failed to determine current directory")?
                .to_string_lossy()
                .into_owned(),
        };

        let command_log = command_log.map(absolutize).transpose()?;

        Ok(Self {
            shim_library,
            root_directory,
            command_log,
            target_command,
        })
    }
}

/// The shim library sits next to the driver's own (symlink-resolved)
/// executable; a driver installed without it is misconfigured.
pub fn locate_shim_library() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to resolve own executable path")?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable has no parent directory"))?;

    let library = dir.join(SHIM_LIBRARY_NAME);
    let library = fs::canonicalize(&library).unwrap_or(library);
    ensure!(
        library.is_file(),
        "interceptor library could not be found at {}",
        library.display()
    );
    Ok(library)
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()
            .context("failed to determine current directory")?
            .join(path))
    }
}

/// Runs the build under interception and returns the exit code to pass on.
///
/// The command log is truncated before the build starts and compacted after
/// it finishes, even when the build failed or could not be spawned.
pub fn run_build(config: &DriverConfig) -> Result<i32> {
    if let Some(log) = &config.command_log {
        fs::write(log, b"")
            .with_context(|| format!("failed to truncate command log {}", log.display()))?;
    }

    let mut command = ProcessCommand::new(&config.target_command[0]);
    command.args(&config.target_command[1..]);
    command.env(ENV_PRELOAD, &config.shim_library);
    command.env(ENV_ROOT_DIRECTORY, &config.root_directory);
    if let Some(log) = &config.command_log {
        command.env(ENV_COMMAND_LOG, log);
    }

    debug!(
        command = %config.target_command.join(" "),
        root = %config.root_directory,
        "spawning build"
    );

    let exit_code = match command.status() {
        Ok(status) => exit_code_from(status),
        Err(err) => {
            warn!("failed to spawn {}: {err}", config.target_command[0]);
            127
        }
    };

    if let Some(log) = &config.command_log {
        match interceptor_trace::compact(log, &config.root_directory) {
            Ok(compacted) => debug!(commands = compacted.commands.len(), "compacted command log"),
            Err(err) => warn!("failed to compact command log: {err:#}"),
        }
    }

    Ok(exit_code)
}

fn exit_code_from(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(1)
}
