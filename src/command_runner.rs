//! Abstraction over external command execution for testability.
//!
//! [`RealCommandRunner`] delegates to [`std::process::Command`].
//! [`RecordingRunner`] records calls and returns canned exit codes so the
//! executor can be tested without a container runtime.

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus, Stdio};

/// Runs one external program to completion.
pub trait CommandRunner {
    /// Run with stdin, stdout and stderr inherited from this process.
    fn run_status(&self, program: &str, args: &[String]) -> Result<ExitStatus>;

    /// Run with all standard streams attached to the null device.
    fn run_quiet(&self, program: &str, args: &[String]) -> Result<ExitStatus>;
}

/// Production implementation that delegates to [`std::process::Command`].
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_status(&self, program: &str, args: &[String]) -> Result<ExitStatus> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to run '{program}'"))
    }

    fn run_quiet(&self, program: &str, args: &[String]) -> Result<ExitStatus> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run '{program}'"))
    }
}

/// Test double that records invocations.
#[cfg(test)]
pub use recording::RecordingRunner;
