//! Schema command implementation.

use anyhow::{Context, Result};
use clap::Args;
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;

use crate::manifest::FragmentDoc;
use crate::output::Output;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Write the schema to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = schema_for!(FragmentDoc);
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write schema to {}", path.display()))?;
            Output::success(format!("Wrote {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}
