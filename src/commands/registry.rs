//! Registry command implementation.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::commands::update;
use crate::output::Output;
use crate::registry::{Registry, RepoEntry, SourceKind};
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub action: RegistryAction,
}

#[derive(Debug, Subcommand)]
pub enum RegistryAction {
    /// Add or replace a source, then update the cache
    Add {
        /// Source name
        name: String,
        /// File path or URL of a fragment
        path: String,
        /// Source type (inferred from the path when omitted)
        #[arg(long = "type", value_enum)]
        kind: Option<SourceKind>,
    },
    /// Remove a source, then update the cache
    #[command(alias = "rm")]
    Remove {
        /// Source name
        name: String,
    },
    /// List registered sources
    #[command(alias = "ls")]
    List,
}

pub fn run(args: RegistryArgs, settings: &Settings) -> Result<()> {
    let path = settings.registry_path();
    let mut registry = Registry::load(&path)?;

    match args.action {
        RegistryAction::Add { name, path: source, kind } => {
            let entry = RepoEntry::new(&name, source, kind);
            Output::success(format!("Registered {name} ({}: {})", entry.kind, entry.path));
            registry.upsert(entry);
            registry.save(&path)?;
            update::run(settings)
        }
        RegistryAction::Remove { name } => {
            if registry.remove(&name) {
                registry.save(&path)?;
                Output::success(format!("Removed {name}"));
                update::run(settings)
            } else {
                Output::warning(format!("No source named {name}"));
                Ok(())
            }
        }
        RegistryAction::List => {
            if registry.repos.is_empty() {
                Output::info("No registry sources");
            }
            for repo in &registry.repos {
                Output::kv(&repo.name, format!("{} ({})", repo.path, repo.kind));
            }
            Ok(())
        }
    }
}
