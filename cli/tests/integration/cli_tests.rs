//! Argument parsing, help and version.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::helpers::curfew;

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    curfew().assert().code(2).stderr(predicate::str::contains(
        "Restrict apps and sites on this machine",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    curfew()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("restrict"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_version_flag_shows_version() {
    curfew()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("curfew"));
}

#[test]
fn test_version_command_shows_version() {
    curfew()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("curfew 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = curfew()
        .args(["version", "--json"])
        .output()
        .expect("run curfew");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["version"], "0.1.0");
}

#[test]
fn test_unknown_subcommand_fails() {
    curfew().arg("frobnicate").assert().failure();
}

#[test]
fn test_internet_requires_block_or_allow() {
    curfew().arg("internet").assert().code(2);
}
