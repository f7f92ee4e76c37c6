//! Projection of a compacted log into a `compile_commands.json` database.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use interceptor_common::Command;
use interceptor_trace::Log;

const COMPILERS: [&str; 4] = ["clang", "clang++", "gcc", "g++"];
const SOURCE_EXTENSIONS: [&str; 5] = ["c", "cc", "cpp", "cxx", "S"];

/// One `compile_commands.json` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub arguments: Vec<String>,
}

/// Emits one entry per (compile command, source-file input) pair.
///
/// Compile commands are those whose argv0 basename is a known compiler and
/// which do not run the bare preprocessor (`-E`).
pub fn project(log: &Log) -> Vec<CompileCommand> {
    let mut entries = Vec::new();

    for command in &log.commands {
        let Some(argv0) = command.arguments.first() else {
            continue;
        };
        let basename = Path::new(argv0)
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if !COMPILERS.contains(&basename.as_ref()) {
            continue;
        }
        if command.arguments.iter().any(|arg| arg == "-E") {
            continue;
        }

        let output = unique_object_output(command);

        for input in &command.inputs {
            if !has_source_extension(input) {
                continue;
            }
            entries.push(CompileCommand {
                directory: Path::new(&log.root_directory)
                    .join(&command.current_directory)
                    .to_string_lossy()
                    .into_owned(),
                file: input.clone(),
                output: output.clone(),
                arguments: command.arguments.clone(),
            });
        }
    }

    entries
}

/// The command's single real artifact, if it has exactly one. `.d` files
/// are make dependency files, not artifacts.
fn unique_object_output(command: &Command) -> Option<String> {
    let mut outputs = command
        .outputs
        .iter()
        .filter(|output| Path::new(output.as_str()).extension() != Some(OsStr::new("d")));
    match (outputs.next(), outputs.next()) {
        (Some(output), None) => Some(output.clone()),
        _ => None,
    }
}

fn has_source_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(OsStr::to_str)
        .map(|extension| SOURCE_EXTENSIONS.contains(&extension))
        .unwrap_or(false)
}

/// Renders the database as a JSON array; no entries renders as `[]`.
pub fn render(log: &Log) -> Result<String> {
    let entries = project(log);
    if entries.is_empty() {
        return Ok("[]\n".to_string());
    }
    let mut rendered = serde_json::to_string_pretty(&entries)?;
    rendered.push('\n');
    Ok(rendered)
}
