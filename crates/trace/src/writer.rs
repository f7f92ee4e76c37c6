use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use anyhow::{ensure, Context, Result};

use crate::frame::encode_varint;
use crate::record::Record;

/// Largest frame the OS appends atomically with a single `write` on a file
/// opened in append mode.
const ATOMIC_APPEND_LIMIT: usize = libc::PIPE_BUF;

/// Appends one length-delimited record to the shared log at `path`.
///
/// Arbitrary sibling processes append to the same file concurrently, so the
/// whole frame is serialised up front and emitted with a single `write`.
/// Frames larger than `PIPE_BUF` lose that atomicity guarantee and are
/// written under an exclusive file lock instead.
pub fn append_record(path: &Path, record: &Record) -> Result<()> {
    let payload = serde_json::to_vec(record).context("failed to serialize log record")?;
    let mut buffer = Vec::with_capacity(payload.len() + 10);
    encode_varint(payload.len() as u64, &mut buffer);
    buffer.extend_from_slice(&payload);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open command log {}", path.display()))?;

    if buffer.len() <= ATOMIC_APPEND_LIMIT {
        let written = file.write(&buffer).context("failed to append log record")?;
        ensure!(written == buffer.len(), "short write of log record");
    } else {
        flock(&file, libc::LOCK_EX)?;
        let result = file.write_all(&buffer);
        let _ = flock(&file, libc::LOCK_UN);
        result.context("failed to append log record")?;
    }
    Ok(())
}

fn flock(file: &File, operation: libc::c_int) -> Result<()> {
    let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
    ensure!(
        rc == 0,
        "flock on command log failed: {}",
        std::io::Error::last_os_error()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_stream;
    use interceptor_common::Command;
    use std::fs;
    use tempfile::TempDir;

    fn sample_command(name: &str) -> Command {
        Command::new(name, "/root", vec![name.to_string()], &[])
    }

    #[test]
    fn appended_records_decode_in_order() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("commands.bin");

        let a = Record::Command(sample_command("/bin/gcc"));
        let b = Record::Command(sample_command("/bin/ld"));
        append_record(&log, &a).unwrap();
        append_record(&log, &b).unwrap();

        let bytes = fs::read(&log).unwrap();
        assert_eq!(decode_stream(&bytes), vec![a, b]);
    }

    #[test]
    fn appends_never_rewrite_existing_bytes() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("commands.bin");

        append_record(&log, &Record::Command(sample_command("/bin/gcc"))).unwrap();
        let before = fs::read(&log).unwrap();
        append_record(&log, &Record::Command(sample_command("/bin/ld"))).unwrap();
        let after = fs::read(&log).unwrap();

        assert!(after.len() > before.len());
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn oversized_frames_round_trip() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("commands.bin");

        let mut command = sample_command("/bin/gcc");
        command.arguments = (0..2048).map(|i| format!("-DVALUE_{i}")).collect();
        let record = Record::Command(command);
        append_record(&log, &record).unwrap();

        let bytes = fs::read(&log).unwrap();
        assert!(bytes.len() > ATOMIC_APPEND_LIMIT);
        assert_eq!(decode_stream(&bytes), vec![record]);
    }
}
