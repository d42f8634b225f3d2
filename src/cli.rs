//! CLI argument definitions for dockerbox.
//!
//! Separated from `main.rs` so that shell completion generation can
//! reference these types.

use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Debug, Parser)]
#[command(name = "dockerbox")]
#[command(about = "Run containers as if they were native executables")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available applets
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Install applet symlinks into the install directory
    Install(commands::install::TargetArgs),

    /// Remove applet symlinks from the install directory
    Uninstall(commands::install::TargetArgs),

    /// Manage registry sources
    Registry(commands::registry::RegistryArgs),

    /// Fetch registry sources into the local cache
    Update,

    /// Print version information
    Version,

    /// Print the merged applet table as JSON
    Debug,

    /// Print the commands an applet invocation would run
    Plan(commands::run::InvokeArgs),

    /// Run an applet
    Run(commands::run::InvokeArgs),

    /// Print the JSON schema of fragment files
    Schema(commands::schema::SchemaArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}
