//! Offline renderer for compacted command logs.
//!
//! Reads the manifest the driver leaves behind and emits either a
//! round-trippable text dump or a `compile_commands.json` database.

mod compdb;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use interceptor_trace::{read_log, Log};

// sysexits-style codes, matching the documented CLI contract
const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;
const EX_CANTCREAT: u8 = 73;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum OutputType {
    /// Human-readable dump of the whole log
    Text,
    /// `compile_commands.json` for downstream tooling
    Compdb,
}

#[derive(Parser, Debug)]
#[command(
    name = "intercept-dump",
    about = "Render a compacted command log as text or as a compilation database",
    version
)]
struct Cli {
    /// Compacted command log to read
    #[arg(short = 'l', long = "command-log", value_name = "FILE")]
    command_log: PathBuf,

    /// File to write the rendering to
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    #[arg(
        short = 't',
        long = "output-type",
        value_name = "TYPE",
        default_value = "text"
    )]
    output_type: OutputType,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EX_USAGE),
            };
        }
    };

    if !cli.command_log.is_file() {
        eprintln!("No such file: {}", cli.command_log.display());
        return ExitCode::from(EX_NOINPUT);
    }

    let log = match read_log(&cli.command_log) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("intercept-dump: {err:#}");
            return ExitCode::from(EX_NOINPUT);
        }
    };

    let rendered = match render(&log, cli.output_type) {
        Ok(rendered) => rendered,
        Err(err) => {
            eprintln!("intercept-dump: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = fs::write(&cli.output, rendered) {
        eprintln!("Could not open output file for writing: {err}");
        return ExitCode::from(EX_CANTCREAT);
    }

    ExitCode::SUCCESS
}

fn render(log: &Log, output_type: OutputType) -> Result<String> {
    match output_type {
        OutputType::Text => {
            let mut rendered = serde_json::to_string_pretty(log)?;
            rendered.push('\n');
            Ok(rendered)
        }
        OutputType::Compdb => compdb::render(log),
    }
}
