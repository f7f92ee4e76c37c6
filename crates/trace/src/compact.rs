use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::reader::decode_stream;
use crate::record::{Log, Record};

/// Reads a finalised log as written by [`compact`].
pub fn read_log(path: &Path) -> Result<Log> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read command log {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a compacted command log", path.display()))
}

/// Rewrites the streamed log at `path` as a single `Log` manifest.
///
/// Decoding stops at the first corrupt frame and compacts the prefix. A file
/// that is already compacted is rewritten unchanged, keeping the root
/// directory recorded in it, so compaction is idempotent. The rewrite goes
/// through a sibling temp file and a rename; readers never observe a
/// half-written manifest.
pub fn compact(path: &Path, root_directory: &str) -> Result<Log> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read command log {}", path.display()))?;

    let log = match serde_json::from_slice::<Log>(&bytes) {
        Ok(log) => log,
        Err(_) => {
            let commands = decode_stream(&bytes)
                .into_iter()
                .filter_map(|record| match record {
                    Record::Command(command) => Some(command),
                    Record::Meta(_) => None,
                })
                .collect();
            Log {
                root_directory: root_directory.to_string(),
                commands,
            }
        }
    };

    let serialized = serde_json::to_vec(&log).context("failed to serialize compacted log")?;
    let temp = path.with_extension("tmp");
    fs::write(&temp, &serialized)
        .with_context(|| format!("failed to write {}", temp.display()))?;
    fs::rename(&temp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(log)
}
