//! Applet invocation: `run`, `plan`, and the symlinked form.

use anyhow::Result;
use clap::Args;

use crate::command_runner::RealCommandRunner;
use crate::executor;
use crate::invocation;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct InvokeArgs {
    /// Applet to invoke
    pub applet: String,

    /// Override flags, the separator, and container arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl InvokeArgs {
    /// Arguments after the applet name exactly as they appear in `argv`.
    ///
    /// clap swallows a `--` directly after the applet name, which would make
    /// `dockerbox run web -- ...` split differently from the symlinked
    /// `web -- ...`. Falls back to the parsed arguments when the applet name
    /// cannot be located.
    pub fn raw_args(&self, argv: &[String]) -> Vec<String> {
        // argv[0] is the executable, argv[1] the subcommand
        argv.iter()
            .skip(2)
            .position(|arg| *arg == self.applet)
            .map(|idx| argv[idx + 3..].to_vec())
            .unwrap_or_else(|| self.args.clone())
    }
}

/// Resolve and execute an applet.
pub fn run(applet: &str, args: &[String], session: &Session) -> Result<()> {
    let table = session.load_table()?;
    let options = session.settings.compile_options();
    let commands = invocation::prepare(&table, applet, args, &session.settings.separator, &options)?;
    executor::execute(&commands, &RealCommandRunner)
}

/// Print the commands an invocation would run, one shell line each.
///
/// Silent commands are suffixed with `|| true`.
pub fn plan(applet: &str, args: &[String], session: &Session) -> Result<()> {
    let table = session.load_table()?;
    let options = session.settings.compile_options();
    let commands = invocation::prepare(&table, applet, args, &session.settings.separator, &options)?;

    for command in commands {
        if command.silent {
            println!("{command} || true");
        } else {
            println!("{command}");
        }
    }
    Ok(())
}
