use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use interceptor_driver::{run_build, DriverConfig};

/// Configuration errors (sysexits EX_CONFIG).
const EX_CONFIG: u8 = 78;

#[derive(Parser, Debug)]
#[command(
    name = "intercept",
    about = "Run a build command with every compiler, linker and archiver invocation recorded",
    version
)]
struct Cli {
    /// Record intercepted commands into this file
    #[arg(long = "command-log", value_name = "PATH")]
    command_log: Option<PathBuf>,

    /// The build command to run
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match DriverConfig::new(cli.command, cli.command_log) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("intercept: {err:#}");
            return ExitCode::from(EX_CONFIG);
        }
    };

    match run_build(&config) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            eprintln!("intercept: {err:#}");
            ExitCode::FAILURE
        }
    }
}
