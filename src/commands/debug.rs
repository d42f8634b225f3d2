//! Debug command implementation.

use anyhow::{Context, Result};

use crate::session::Session;

/// Print the merged applet table as pretty JSON.
pub fn run(session: &Session) -> Result<()> {
    let table = session.load_table()?;
    let json = serde_json::to_string_pretty(&table).context("Failed to serialize applet table")?;
    println!("{json}");
    Ok(())
}
