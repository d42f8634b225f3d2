//! Sequential execution of compiled commands.

use anyhow::Result;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use tracing::{debug, info};

use crate::applet::CommandSpec;
use crate::command_runner::CommandRunner;
use crate::error::DockerboxError;

/// Exit code a process should mirror for `status`.
///
/// A child killed by a signal maps to `128 + signal`, as shells report it.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

/// Run `commands` in order, stopping at the first failing non-silent one.
///
/// Silent commands run detached from the terminal; their failures, spawn
/// errors included, are logged and ignored. A failing non-silent command
/// yields [`DockerboxError::CommandExecution`] carrying its exit code.
pub fn execute(commands: &[CommandSpec], runner: &dyn CommandRunner) -> Result<()> {
    for command in commands {
        let program = command.program();
        let args = command.args();

        if command.silent {
            match runner.run_quiet(program, args) {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    debug!(command = %command, code = exit_code(&status), "silent command failed");
                }
                Err(e) => debug!(command = %command, error = %e, "silent command failed"),
            }
            continue;
        }

        info!(command = %command, "running");
        let status = runner.run_status(program, args)?;
        if !status.success() {
            return Err(DockerboxError::CommandExecution {
                command: command.to_string(),
                code: exit_code(&status),
            }
            .into());
        }
    }
    Ok(())
}
