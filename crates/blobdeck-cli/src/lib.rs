pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::{Context, Result};
use blobdeck_core::config::resolve_config_path;
use clap::Parser;

use crate::cli::Cli;
use crate::diagnostics::DiagnosticsSession;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => resolve_config_path().context("failed to resolve blobdeck config path")?,
    };
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics, &config_path)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    let result = dispatch::run_with_deps(cli, &config_path, &cwd);
    if let Err(error) = &result {
        diagnostics.record(format!("command failed: {error:#}"));
    }
    result
}
