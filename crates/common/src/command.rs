//! In-memory model of one intercepted program-replacement call.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::{analyze_command, AnalysisResult};
use crate::relpath::relative_to;
use crate::ENV_ROOT_DIRECTORY;

pub type EnvMap = BTreeMap<String, String>;

/// One spawn as seen by the trampoline: the program the kernel will load,
/// the argv/envp it was handed, and the inputs/outputs derived by analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub program: String,
    pub current_directory: String,
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables: EnvMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
}

/// Splits raw `KEY=VALUE` environment strings into a map. Entries without
/// `=` are dropped; later duplicates override earlier ones.
pub fn parse_environment(raw: &[String]) -> EnvMap {
    raw.iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl Command {
    pub fn new(
        program: impl Into<String>,
        current_directory: impl Into<String>,
        arguments: Vec<String>,
        raw_environment: &[String],
    ) -> Self {
        Self {
            program: program.into(),
            current_directory: current_directory.into(),
            arguments,
            environment_variables: parse_environment(raw_environment),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Single-line diagnostic rendering: the command string with `\t`/`\n`
    /// escaped, derived inputs/outputs and the working directory.
    pub fn repr(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in self.arguments.iter().skip(1) {
            cmd.push(' ');
            cmd.push_str(&arg.replace('\t', "\\t").replace('\n', "\\n"));
        }
        json!({
            "cmd": cmd,
            "in": self.inputs,
            "out": self.outputs,
            "cwd": self.current_directory,
        })
        .to_string()
    }

    /// Rewrites the working directory, the program and every argument to be
    /// relative to the root directory named by `INTERCEPTOR_root_directory`
    /// in this command's own environment. Without that variable, or when the
    /// working directory lies outside the root, nothing changes.
    ///
    /// The substitution is textual over the path strings, not path-aware:
    /// compiler flags embed paths in arbitrary positions (`-I/abs/path`,
    /// `-Wl,-rpath,/abs/path`) and bitwise-identical argvs are what remote
    /// caches key on.
    pub fn make_relative(&mut self) {
        let Some(root) = self.environment_variables.get(ENV_ROOT_DIRECTORY) else {
            return;
        };
        let mut root_dir = root.clone();
        if !root_dir.ends_with('/') {
            root_dir.push('/');
        }

        let cwd = Path::new(&self.current_directory);
        let mut rel_root = relative_to(Path::new(&root_dir), cwd);
        if !rel_root.ends_with('/') {
            rel_root.push('/');
        }
        if rel_root == "./" {
            rel_root.clear();
        }

        // The root is not expressible as a relative prefix from here; this
        // happens when the working directory is outside the root.
        if rel_root.contains(&root_dir) {
            return;
        }

        let relative_cwd = relative_to(cwd, Path::new(&root_dir));
        self.current_directory = relative_cwd;

        self.program = self.program.replace(&root_dir, &rel_root);
        for arg in &mut self.arguments {
            *arg = arg.replace(&root_dir, &rel_root);
        }
    }

    /// Runs argument analysis and records the derived inputs and outputs.
    ///
    /// Leading `./` is stripped from every derived path. Every input must
    /// name a regular file at this moment; a violation means the analysis
    /// contract is broken and is reported as an error.
    pub fn analyze(&mut self) -> Result<()> {
        let AnalysisResult {
            mut inputs,
            mut outputs,
        } = analyze_command(self);

        for path in inputs.iter_mut().chain(outputs.iter_mut()) {
            if let Some(stripped) = path.strip_prefix("./") {
                *path = stripped.to_string();
            }
        }

        for input in &inputs {
            if !Path::new(input).is_file() {
                bail!("missing input: {input}");
            }
        }

        self.inputs = inputs;
        self.outputs = outputs;
        Ok(())
    }
}
