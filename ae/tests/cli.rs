//! Command-line tests for the `ae` binary
//!
//! Each test runs in its own temp directory with HOME pointed there, so no
//! user config or credentials leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ae(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ae").expect("binary should build");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    ae(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn test_config_prints_defaults() {
    let home = TempDir::new().unwrap();
    ae(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("provider: openai"))
        .stdout(predicate::str::contains("classify-retries: 1"));
}

#[test]
fn test_local_config_file_is_picked_up() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".autoevolver.yml"), "llm:\n  model: local-model\n").unwrap();
    ae(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("model: local-model"));
}

#[test]
fn test_logs_list_when_empty() {
    let home = TempDir::new().unwrap();
    ae(&home)
        .args(["logs", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No session logs"));
}

#[test]
fn test_logs_shows_latest_session() {
    let home = TempDir::new().unwrap();
    let log_dir = home.path().join("log");
    std::fs::create_dir_all(&log_dir).unwrap();
    std::fs::write(
        log_dir.join("20240101_000000.json"),
        r#"[{"sender":"System","content":"older","timestamp":"2024/01/01 00:00:00"}]"#,
    )
    .unwrap();
    std::fs::write(
        log_dir.join("20240102_000000.json"),
        r#"[{"sender":"System","content":"=== Start Session ===","timestamp":"2024/01/02 00:00:00"}]"#,
    )
    .unwrap();

    ae(&home)
        .arg("logs")
        .assert()
        .success()
        .stdout(predicate::str::contains("[2024/01/02 00:00:00] System: === Start Session ==="))
        .stdout(predicate::str::contains("older").not());
}

#[test]
fn test_plan_without_credential_fails_before_prompting() {
    let home = TempDir::new().unwrap();
    ae(&home)
        .args(["plan", "Write a greeting function"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_plan_rejects_blank_objective() {
    let home = TempDir::new().unwrap();
    ae(&home)
        .args(["plan", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The objective has not been entered."));
}
