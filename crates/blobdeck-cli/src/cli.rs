use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "blobdeck")]
#[command(bin_name = "blobdeck")]
#[command(version)]
#[command(about = "Terminal admin console for a content-addressable store")]
pub struct Cli {
    /// Write a diagnostics log under the config directory.
    #[arg(long, global = true)]
    pub diagnostics: bool,

    /// Config file to use instead of ~/.config/blobdeck/config.toml.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Run environment and configuration checks")]
    Doctor,
}
