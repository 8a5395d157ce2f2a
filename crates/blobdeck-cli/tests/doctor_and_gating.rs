mod support;

use predicates::prelude::*;
use std::fs;

use support::{
    assert_timestamp_log_names, new_command_with_temp_home, write_config, write_snapshot,
    write_valid_config,
};

#[test]
fn root_help_runs_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: blobdeck"))
        .stdout(predicate::str::contains("--diagnostics"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn doctor_help_runs_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .args(["doctor", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Run environment and configuration checks",
        ));
}

#[test]
fn unknown_subcommands_are_rejected() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .arg("purge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn doctor_runs_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("config file exists"))
        .stdout(predicate::str::contains(".config/blobdeck/config.toml"))
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("store snapshot configured"));
}

#[test]
fn doctor_passes_with_valid_config_and_snapshot() {
    let (mut command, temp_home) = new_command_with_temp_home();
    write_valid_config(temp_home.path());

    command
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 space(s)"))
        .stdout(predicate::str::contains("5 passed, 0 failed"));
}

#[test]
fn doctor_honours_config_flag() {
    let (mut command, temp_home) = new_command_with_temp_home();
    let custom = temp_home.path().join("elsewhere.toml");
    fs::write(&custom, "version = 2\n").expect("write config");

    command
        .args(["doctor", "--config"])
        .arg(&custom)
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.toml"))
        .stdout(predicate::str::contains("version must be 1"));
}

#[test]
fn doctor_reads_snapshot_from_dotenv() {
    let (mut command, temp_home) = new_command_with_temp_home();
    let snapshot = write_snapshot(temp_home.path());
    fs::write(
        temp_home.path().join(".env"),
        format!("# local store\nBLOBDECK_SNAPSHOT={}\n", snapshot.display()),
    )
    .expect("write .env");

    command
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("store.toml"))
        .stdout(predicate::str::contains("1 space(s)"));
}

#[test]
fn root_command_requires_a_snapshot_before_tui() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: no store snapshot configured"))
        .stderr(predicate::str::contains("BLOBDECK_SNAPSHOT"));
}

#[test]
fn root_command_reports_invalid_config() {
    let (mut command, temp_home) = new_command_with_temp_home();
    write_config(
        temp_home.path(),
        "version = 1\n\n[defaults]\nconcurrency = 99\n",
    );

    command
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config at"))
        .stderr(predicate::str::contains("defaults.concurrency"));
}

#[test]
fn root_command_reports_unreadable_snapshot() {
    let (mut command, temp_home) = new_command_with_temp_home();
    write_config(
        temp_home.path(),
        "version = 1\n\n[store]\nsnapshot = \"/nonexistent/blobdeck/store.toml\"\n",
    );

    command
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open store snapshot"));
}

#[test]
fn doctor_with_diagnostics_creates_log_file() {
    let (mut command, temp_home) = new_command_with_temp_home();
    command
        .args(["--diagnostics", "doctor"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Diagnostics enabled:"));

    let diagnostics_dir = temp_home.path().join(".config/blobdeck/diagnostics");
    let logs: Vec<_> = fs::read_dir(&diagnostics_dir)
        .expect("diagnostics dir")
        .filter_map(Result::ok)
        .collect();
    assert_timestamp_log_names(&logs);

    let contents = fs::read_to_string(logs[0].path()).expect("read log");
    assert!(contents.starts_with("blobdeck diagnostics start"));
    assert!(contents.contains("argv="));
}
