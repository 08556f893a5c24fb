//! Command-line behaviour of the `fanscan` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `fanscan` command isolated from the caller's credentials and config.
fn fanscan(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fanscan").unwrap();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"));
    cmd
}

#[test]
fn help_lists_engine_flag() {
    let home = TempDir::new().unwrap();
    fanscan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--engine"));
}

#[test]
fn fails_without_credentials() {
    let home = TempDir::new().unwrap();
    fanscan(&home)
        .args(["-q", "product:nginx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no provider credentials configured"));
}

#[test]
fn fails_on_unknown_engine() {
    let home = TempDir::new().unwrap();
    fanscan(&home)
        .env("SHODAN_API_KEY", "dummy")
        .args(["-q", "product:nginx", "-e", "shodan,zoomeye"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider: zoomeye"));
}

#[test]
fn fails_without_queries() {
    let home = TempDir::new().unwrap();
    fanscan(&home)
        .env("SHODAN_API_KEY", "dummy")
        .write_stdin("\n  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no queries provided"));
}

#[test]
fn rejects_malformed_provider_config() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("keys.toml");
    std::fs::write(&config, "censys = [\"missing-secret\"]\n").unwrap();

    fanscan(&home)
        .args(["-q", "x", "--provider-config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("censys"));
}
