//! Command analysis: deriving inputs and outputs from tool argv grammars.
//!
//! Analysers are plain functions dispatched through a prioritised regex
//! table matched against argv0. First match wins, so the table reads as a
//! flat list of rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::command::{Command, EnvMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// A pure function from `(program, arguments, environment)` to derived
/// inputs and outputs.
pub type Analyzer = fn(&str, &[String], &EnvMap) -> AnalysisResult;

/// Flags whose value argument is neither an input nor an output.
const SKIP_NEXT_ARGS: [&str; 6] = ["-isystem", "-I", "-L", "-m", "-soname", "-z"];

/// `-Wp,-MMD,<file>` names a make dependency file: an output, never an input.
const DEP_FILE_OPTION: &str = "-Wp,-MMD,";

static ANALYZERS: Lazy<Vec<(Regex, Analyzer)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^(.*/)?(clang|clang\+\+|gcc|g\+\+|ld(\.lld)?|llvm-strip)$").unwrap(),
            analyze_compiler_linker as Analyzer,
        ),
        (
            Regex::new(r"^(.*/)?(llvm-)?ar$").unwrap(),
            analyze_archiver as Analyzer,
        ),
    ]
});

/// Dispatches `command` to the first analyser whose pattern matches argv0.
/// Tools match on how they were invoked, not on the program path the kernel
/// sees. Unknown tools yield an empty result.
pub fn analyze_command(command: &Command) -> AnalysisResult {
    let Some(argv0) = command.arguments.first() else {
        return AnalysisResult::default();
    };
    for (pattern, analyzer) in ANALYZERS.iter() {
        if pattern.is_match(argv0) {
            return analyzer(
                &command.program,
                &command.arguments,
                &command.environment_variables,
            );
        }
    }
    AnalysisResult::default()
}

fn analyze_compiler_linker(_program: &str, args: &[String], _env: &EnvMap) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    let mut next_is_out = false;
    let mut skip_next = false;

    for arg in args.iter().skip(1) {
        if arg == "-o" {
            next_is_out = true;
            continue;
        }
        if next_is_out {
            result.outputs.push(arg.clone());
            next_is_out = false;
            continue;
        }
        if let Some(dep_file) = arg.strip_prefix(DEP_FILE_OPTION) {
            result.outputs.push(dep_file.to_string());
        }
        if skip_next {
            skip_next = false;
            continue;
        }
        if SKIP_NEXT_ARGS.contains(&arg.as_str()) {
            skip_next = true;
        }
        // test compilations and preprocessor probes
        if arg == "/dev/null" || arg == "-" {
            return AnalysisResult::default();
        }
        if arg.starts_with('-') {
            continue;
        }
        result.inputs.push(arg.clone());
    }

    result
}

fn analyze_archiver(_program: &str, args: &[String], _env: &EnvMap) -> AnalysisResult {
    // args[1] are the archiver flags, args[2] the archive, args[3..] members
    if args.len() < 3 {
        return AnalysisResult::default();
    }
    AnalysisResult {
        inputs: args[3..].to_vec(),
        outputs: vec![args[2].clone()],
    }
}
