use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("blobdeck");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    for key in [
        "BLOBDECK_SNAPSHOT",
        "BLOBDECK_PROFILE",
        "BLOBDECK_PROVIDER_DID",
        "RUST_LOG",
    ] {
        command.env_remove(key);
    }
    command.current_dir(temp_home.path());
    (command, temp_home)
}

pub fn write_snapshot(dir: &Path) -> PathBuf {
    let path = dir.join("store.toml");
    fs::write(
        &path,
        r#"
agent = "did:key:agent"
accounts = ["did:mailto:example.com:ops"]

[[spaces]]
did = "did:key:space"
name = "primary"
access = "public"

[[spaces.uploads]]
root = "bafyone"
"#,
    )
    .expect("write snapshot");
    path
}

pub fn write_config(home: &Path, body: &str) -> PathBuf {
    let config_dir = home.join(".config").join("blobdeck");
    fs::create_dir_all(&config_dir).expect("create config dir");
    let path = config_dir.join("config.toml");
    fs::write(&path, body).expect("write config");
    path
}

pub fn write_valid_config(home: &Path) -> PathBuf {
    let snapshot = write_snapshot(home);
    write_config(
        home,
        &format!(
            "version = 1\n\n[store]\nsnapshot = {:?}\n\n[defaults]\npage_size = 20\n",
            snapshot.display().to_string()
        ),
    )
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
