//! Exercises the `europa` binary as a subprocess, the same way the CLI
//! tests in the reference driver crate treat their own binary as a black
//! box rather than calling its internals directly.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn europa_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_europa"))
}

#[test]
fn help_output_mentions_the_binary_name() {
    let mut cmd = Command::new(europa_bin());
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("europa"));
}

#[test]
fn version_flag_prints_the_package_version() {
    let mut cmd = Command::new(europa_bin());
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn run_evaluates_a_file_and_prints_the_final_value() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("program.scm");
    std::fs::write(&path, "(+ 1 2 3)").unwrap();

    let mut cmd = Command::new(europa_bin());
    cmd.arg("run").arg(&path);
    cmd.assert().success().stdout(predicate::str::contains("6"));
}

#[test]
fn run_reports_an_error_for_a_missing_file() {
    let mut cmd = Command::new(europa_bin());
    cmd.arg("run").arg("/nonexistent/path/to/program.scm");
    cmd.assert().failure();
}
