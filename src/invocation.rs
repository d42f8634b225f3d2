//! Turning an applet invocation into a command plan.

use anyhow::Result;
use tracing::debug;

use crate::applet::overrides::split_args;
use crate::applet::{AppletOverrides, AppletTable, CommandSpec, CompileOptions, plan_invocation};
use crate::error::DockerboxError;

/// Plan the commands for `applet_name` invoked with `args`.
///
/// `args` is everything after the executable (or after `run <applet>`).
/// Arguments before `separator` are override flags; clap parse errors,
/// including `--help`, are returned as [`clap::Error`].
pub fn prepare(
    table: &AppletTable,
    applet_name: &str,
    args: &[String],
    separator: &str,
    options: &CompileOptions,
) -> Result<Vec<CommandSpec>> {
    let base = table
        .get(applet_name)
        .ok_or_else(|| DockerboxError::AppletNotFound(applet_name.to_string()))?;

    let (flags, extra_args) = split_args(separator, args);
    let overrides = AppletOverrides::parse_for(applet_name, &flags)?;
    let applet = overrides.apply(base);
    if applet.image.is_empty() {
        return Err(DockerboxError::validation(
            "<invocation>",
            format!("applets.{applet_name}.image"),
            "required field is missing or empty",
        )
        .into());
    }

    debug!(
        applet = applet_name,
        overrides = !overrides.is_empty(),
        extra_args = extra_args.len(),
        "preparing invocation"
    );
    Ok(plan_invocation(&applet, table, &extra_args, options)?)
}
