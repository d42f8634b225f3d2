//! Install and uninstall command implementations.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};

use crate::error::DockerboxError;
use crate::install as links;
use crate::output::Output;
use crate::session::Session;

/// Which applets to act on.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["applet", "all"])))]
pub struct TargetArgs {
    /// A single applet by name
    #[arg(short, long)]
    pub applet: Option<String>,

    /// Every applet not listed in `ignore`
    #[arg(long)]
    pub all: bool,
}

fn targets(args: &TargetArgs, session: &Session) -> Result<Vec<String>> {
    let table = session.load_table()?;
    match &args.applet {
        Some(name) => {
            if table.get(name).is_none() {
                return Err(DockerboxError::AppletNotFound(name.clone()).into());
            }
            Ok(vec![name.clone()])
        }
        None => Ok(table.installable().map(str::to_string).collect()),
    }
}

pub fn install(args: TargetArgs, session: &Session) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the dockerbox executable")?;
    let install_dir = &session.settings.install_dir;

    for name in targets(&args, session)? {
        let link = links::install(&exe, install_dir, &name)
            .with_context(|| format!("Failed to install {name}"))?;
        Output::success(format!("Installed {name} -> {}", link.display()));
    }
    Ok(())
}

pub fn uninstall(args: TargetArgs, session: &Session) -> Result<()> {
    let install_dir = &session.settings.install_dir;

    for name in targets(&args, session)? {
        let removed = links::uninstall(install_dir, &name)
            .with_context(|| format!("Failed to uninstall {name}"))?;
        if removed {
            Output::success(format!("Uninstalled {name}"));
        } else {
            Output::warning(format!("{name} is not installed"));
        }
    }
    Ok(())
}
