use std::fmt;
use std::path::Path;

use crate::config::{BlobdeckConfig, load_config};
use crate::env::EnvLayer;
use crate::memory::MemoryStore;
use crate::store::StoreService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

const CONFIG_EXISTS: &str = "config file exists";
const CONFIG_VALID: &str = "config parses and validates";
const SNAPSHOT_CONFIGURED: &str = "store snapshot configured";
const SNAPSHOT_LOADS: &str = "store snapshot loads";
const STORE_LISTS_SPACES: &str = "store lists spaces";

/// Checks the config at `config_path` and the store it points to.
///
/// A missing config file is reported but the remaining checks still run on
/// defaults plus `env`.
pub fn run_doctor(config_path: &Path, env: &EnvLayer) -> DoctorReport {
    let mut checks = Vec::new();

    let mut config = if config_path.exists() {
        checks.push(pass_check(
            CONFIG_EXISTS,
            format!("found at {}", config_path.display()),
        ));
        match load_config(config_path) {
            Ok(config) => {
                checks.push(pass_check(CONFIG_VALID, "config is valid"));
                config
            }
            Err(error) => {
                checks.push(fail_check(CONFIG_VALID, error.to_string()));
                push_skipped_checks(
                    &mut checks,
                    &[SNAPSHOT_CONFIGURED, SNAPSHOT_LOADS, STORE_LISTS_SPACES],
                    "config is invalid",
                );
                return DoctorReport { checks };
            }
        }
    } else {
        checks.push(fail_check(
            CONFIG_EXISTS,
            format!("expected at {}; defaults apply", config_path.display()),
        ));
        checks.push(skipped_check(CONFIG_VALID, "config file is missing"));
        BlobdeckConfig::default()
    };
    config.apply_env(env);

    let Some(snapshot) = config.store.snapshot.clone() else {
        checks.push(fail_check(
            SNAPSHOT_CONFIGURED,
            "set store.snapshot in config or BLOBDECK_SNAPSHOT",
        ));
        push_skipped_checks(
            &mut checks,
            &[SNAPSHOT_LOADS, STORE_LISTS_SPACES],
            "no snapshot is configured",
        );
        return DoctorReport { checks };
    };
    checks.push(pass_check(
        SNAPSHOT_CONFIGURED,
        format!("using {}", snapshot.display()),
    ));

    let store = match MemoryStore::from_snapshot_path(&snapshot) {
        Ok(store) => {
            checks.push(pass_check(SNAPSHOT_LOADS, "snapshot is valid"));
            store
        }
        Err(error) => {
            checks.push(fail_check(SNAPSHOT_LOADS, error.to_string()));
            checks.push(skipped_check(STORE_LISTS_SPACES, "snapshot could not be loaded"));
            return DoctorReport { checks };
        }
    };

    checks.push(check_spaces(&store));
    DoctorReport { checks }
}

fn check_spaces(store: &dyn StoreService) -> DoctorCheck {
    match store.spaces() {
        Ok(spaces) if spaces.is_empty() => fail_check(STORE_LISTS_SPACES, "store has no spaces"),
        Ok(spaces) => pass_check(STORE_LISTS_SPACES, format!("{} space(s)", spaces.len())),
        Err(error) => fail_check(STORE_LISTS_SPACES, error.to_string()),
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn states(report: &DoctorReport) -> Vec<(&str, CheckState)> {
        report
            .checks
            .iter()
            .map(|check| (check.name.as_str(), check.state))
            .collect()
    }

    #[test]
    fn check_state_display_is_uppercase_label() {
        assert_eq!(CheckState::Pass.to_string(), "PASS");
        assert_eq!(CheckState::Fail.to_string(), "FAIL");
    }

    #[test]
    fn missing_config_without_snapshot_skips_store_checks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = run_doctor(&dir.path().join("config.toml"), &EnvLayer::default());

        assert_eq!(
            states(&report),
            vec![
                (CONFIG_EXISTS, CheckState::Fail),
                (CONFIG_VALID, CheckState::Fail),
                (SNAPSHOT_CONFIGURED, CheckState::Fail),
                (SNAPSHOT_LOADS, CheckState::Fail),
                (STORE_LISTS_SPACES, CheckState::Fail),
            ]
        );
        assert_eq!(report.summary(), "0 passed, 5 failed");
    }

    #[test]
    fn healthy_setup_passes_every_check() {
        let dir = tempfile::tempdir().expect("temp dir");
        let snapshot = dir.path().join("store.toml");
        fs::write(&snapshot, "[[spaces]]\ndid = \"did:key:a\"\nname = \"a\"\n").expect("snapshot");
        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "version = 1\n[store]\nsnapshot = {:?}\n",
                snapshot.display().to_string()
            ),
        )
        .expect("config");

        let report = run_doctor(&config, &EnvLayer::default());

        assert!(!report.has_failures(), "{report:?}");
        assert_eq!(report.summary(), "5 passed, 0 failed");
    }

    #[test]
    fn env_snapshot_is_used_when_config_is_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let snapshot = dir.path().join("store.toml");
        fs::write(&snapshot, "not = [valid").expect("snapshot");
        let env = EnvLayer::parse(&format!("BLOBDECK_SNAPSHOT={}\n", snapshot.display()))
            .expect("env")
            .isolated();

        let report = run_doctor(&dir.path().join("config.toml"), &env);

        assert_eq!(report.checks[2].state, CheckState::Pass);
        assert_eq!(report.checks[3].state, CheckState::Fail);
        assert!(report.checks[3].details.contains("failed to parse store snapshot"));
    }
}
