use std::path::Path;

use anyhow::{Context, Result};
use blobdeck_app::App;
use blobdeck_core::doctor::{CheckState, DoctorReport};
use blobdeck_core::env::EnvLayer;
use blobdeck_tui::UiExit;
use comfy_table::{Cell, ContentArrangement, Table};

use crate::cli::{Cli, Command};

pub fn run_with_deps(cli: Cli, config_path: &Path, cwd: &Path) -> Result<()> {
    let env = EnvLayer::load(cwd)
        .with_context(|| format!("failed to read .env in {}", cwd.display()))?;
    tracing::debug!(env_file_keys = env.file_keys(), "loaded environment layer");

    match cli.command {
        Some(Command::Doctor) => run_doctor_command(config_path, &env),
        None => run_root_command(config_path, &env),
    }
}

fn run_root_command(config_path: &Path, env: &EnvLayer) -> Result<()> {
    let config = App::ensure_config_ready(config_path, env)?;
    let app = App::from_config(config)?;

    let exit = blobdeck_tui::run_root(&app)?;
    if exit == UiExit::Canceled {
        tracing::info!("console interrupted");
    } else {
        tracing::info!(exit = ?exit, "console closed");
    }

    Ok(())
}

fn run_doctor_command(config_path: &Path, env: &EnvLayer) -> Result<()> {
    let report = App::doctor(config_path, env);
    print_doctor_report(&report);
    Ok(())
}

fn doctor_table(report: &DoctorReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        let status = match check.state {
            CheckState::Pass => "PASS",
            CheckState::Fail => "FAIL",
        };

        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(status),
            Cell::new(check.details.as_str()),
        ]);
    }
    table
}

fn print_doctor_report(report: &DoctorReport) {
    println!("{}", doctor_table(report));
    println!("{}", report.summary());
}
