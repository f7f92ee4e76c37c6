//! CLI tests for `intercept-dump`.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

use interceptor_common::Command as BuildCommand;
use interceptor_trace::{append_record, compact, read_log, Log, Record};

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn compiled(args: &[&str], inputs: &[&str], outputs: &[&str]) -> BuildCommand {
    BuildCommand {
        program: args[0].to_string(),
        current_directory: ".".to_string(),
        arguments: strings(args),
        environment_variables: Default::default(),
        inputs: strings(inputs),
        outputs: strings(outputs),
    }
}

fn write_compacted_log(dir: &TempDir, commands: Vec<BuildCommand>) -> std::path::PathBuf {
    let path = dir.path().join("commands.bin");
    fs::write(&path, b"").unwrap();
    for command in commands {
        append_record(&path, &Record::Command(command)).unwrap();
    }
    compact(&path, "/root").unwrap();
    path
}

fn dump() -> Command {
    Command::cargo_bin("intercept-dump").unwrap()
}

#[test]
fn text_dump_round_trips() {
    let temp = TempDir::new().unwrap();
    let log_path = write_compacted_log(
        &temp,
        vec![compiled(
            &["gcc", "-c", "-o", "a.o", "a.c"],
            &["a.c"],
            &["a.o"],
        )],
    );
    let out_path = temp.path().join("dump.txt");

    dump()
        .arg("--command-log")
        .arg(&log_path)
        .arg("--output")
        .arg(&out_path)
        .assert()
        .success();

    let rendered = fs::read_to_string(&out_path).unwrap();
    let parsed: Log = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed, read_log(&log_path).unwrap());
}

#[test]
fn compdb_entries_for_compile_commands() {
    let temp = TempDir::new().unwrap();
    let log_path = write_compacted_log(
        &temp,
        vec![
            compiled(
                &["clang", "-Wp,-MMD,build/a.d", "-c", "-o", "build/a.o", "a.c"],
                &["a.c"],
                &["build/a.d", "build/a.o"],
            ),
            // preprocessor probe: analysed but never part of the database
            compiled(&["clang", "-E", "-o", "x.i", "x.c"], &["x.c"], &["x.i"]),
            // linker invocations are not compile commands
            compiled(&["ld.lld", "-o", "bin", "a.o"], &["a.o"], &["bin"]),
        ],
    );
    let out_path = temp.path().join("compile_commands.json");

    dump()
        .arg("--command-log")
        .arg(&log_path)
        .arg("--output")
        .arg(&out_path)
        .args(["--output-type", "compdb"])
        .assert()
        .success();

    let rendered = fs::read_to_string(&out_path).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["directory"], "/root/.");
    assert_eq!(entries[0]["file"], "a.c");
    assert_eq!(entries[0]["output"], "build/a.o");
    assert_eq!(
        entries[0]["arguments"],
        serde_json::json!(["clang", "-Wp,-MMD,build/a.d", "-c", "-o", "build/a.o", "a.c"])
    );
}

#[test]
fn empty_log_renders_an_empty_database() {
    let temp = TempDir::new().unwrap();
    let log_path = write_compacted_log(&temp, Vec::new());
    let out_path = temp.path().join("compile_commands.json");

    dump()
        .arg("--command-log")
        .arg(&log_path)
        .arg("--output")
        .arg(&out_path)
        .args(["--output-type", "compdb"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out_path).unwrap(), "[]\n");
}

#[test]
fn missing_input_exits_with_noinput() {
    let temp = TempDir::new().unwrap();
    dump()
        .arg("--command-log")
        .arg(temp.path().join("absent.bin"))
        .arg("--output")
        .arg(temp.path().join("out"))
        .assert()
        .code(66);
}

#[test]
fn missing_arguments_exit_with_usage() {
    dump().assert().code(64);

    dump()
        .args(["--command-log", "x", "--output", "y", "--output-type", "yaml"])
        .assert()
        .code(64);
}

#[test]
fn unwritable_output_exits_with_cantcreat() {
    let temp = TempDir::new().unwrap();
    let log_path = write_compacted_log(&temp, Vec::new());

    dump()
        .arg("--command-log")
        .arg(&log_path)
        .arg("--output")
        .arg(temp.path().join("no/such/dir/out"))
        .assert()
        .code(73);
}
