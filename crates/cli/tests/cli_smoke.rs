//! CLI smoke tests for pycross
//!
//! These only exercise argument handling; a real invocation would start
//! installing host packages.

use assert_cmd::Command;
use predicates::prelude::*;

fn pycross_cmd() -> Command {
    Command::cargo_bin("pycross").unwrap()
}

#[test]
fn help_flag_works() {
    pycross_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--skip-python-build"))
        .stdout(predicate::str::contains("--skip-packages-build"));
}

#[test]
fn version_flag_works() {
    pycross_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pycross"));
}

#[test]
fn target_is_required() {
    pycross_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}

#[test]
fn unsupported_target_is_rejected() {
    pycross_cmd()
        .args(["--target", "ios-arm64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported build target"));
}

#[test]
fn default_versions_listed_in_help() {
    pycross_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("3.7.16"))
        .stdout(predicate::str::contains("3.3-1"))
        .stdout(predicate::str::contains("1.1.1l-1"));
}
