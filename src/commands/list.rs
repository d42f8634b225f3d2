//! List command implementation.

use anyhow::Result;
use clap::Args;

use crate::output::Output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print only applet names, one per line
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: ListArgs, session: &Session) -> Result<()> {
    let table = session.load_table()?;

    if args.quiet {
        for name in table.applets.keys() {
            println!("{name}");
        }
        return Ok(());
    }

    if table.applets.is_empty() {
        Output::info("No applets defined");
        Output::hint(format!(
            "Add a *.dbx.yaml file to {} or run: dockerbox registry add <name> <path>",
            session.settings.root_dir.display()
        ));
        return Ok(());
    }

    for (name, applet) in &table.applets {
        let marker = if table.is_ignored(name) { " (ignored)" } else { "" };
        Output::list_item(format!("{name:<20} {}{marker}", applet.image_ref()));
    }
    Ok(())
}
