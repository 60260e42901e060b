//! Behavioural smoke tests for the CLI entrypoint that need no cloud
//! access.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn zero_arguments_prints_usage_and_exits_one() {
    let mut cmd = Command::cargo_bin("awssh").expect("binary builds");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"))
        .stderr(predicate::str::contains("--list"));
}

#[test]
fn help_flag_exits_successfully() {
    let mut cmd = Command::cargo_bin("awssh").expect("binary builds");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Name tag"));
}

#[test]
fn unknown_flag_is_rejected() {
    let mut cmd = Command::cargo_bin("awssh").expect("binary builds");
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--bogus"));
}
