//! Hook-graph resolver.
//!
//! Expands an applet's `before_hooks` and `after_hooks` depth-first into a
//! flat, ordered list of commands. A single visited set is threaded through
//! one top-level expansion, so re-entering any applet (a true cycle, or a
//! diamond that reaches the same hook twice) is rejected.

use std::collections::HashSet;
use tracing::{debug, trace};

use super::compile::{CompileOptions, compile_kill, compile_pull, compile_run};
use super::{Applet, AppletTable, CommandSpec};
use crate::error::{DockerboxError, ReferenceKind, Result};

/// Walk the hook graph rooted at `applet` in execution order.
///
/// `emit` is called once per applet, between its before and after hooks,
/// with the extra arguments that applet runs with (only the root gets any).
fn walk<'a>(
    applet: &'a Applet,
    table: &'a AppletTable,
    extra_args: &[String],
    visited: &mut HashSet<String>,
    emit: &mut dyn FnMut(&'a Applet, &[String]),
) -> Result<()> {
    if !visited.insert(applet.applet_name.clone()) {
        return Err(DockerboxError::Cycle {
            applet: applet.applet_name.clone(),
        });
    }

    for hook in &applet.before_hooks {
        let target = lookup(table, hook, ReferenceKind::BeforeHook, applet)?;
        walk(target, table, &[], visited, emit)?;
    }

    emit(applet, extra_args);

    for hook in &applet.after_hooks {
        let target = lookup(table, hook, ReferenceKind::AfterHook, applet)?;
        walk(target, table, &[], visited, emit)?;
    }

    Ok(())
}

fn lookup<'a>(
    table: &'a AppletTable,
    name: &str,
    kind: ReferenceKind,
    referrer: &Applet,
) -> Result<&'a Applet> {
    table
        .get(name)
        .ok_or_else(|| DockerboxError::MissingReference {
            kind,
            name: name.to_string(),
            referrer: referrer.applet_name.clone(),
        })
}

/// Commands contributed by a single applet: pull, kill, then run.
fn applet_commands(applet: &Applet, extra_args: &[String], options: &CompileOptions) -> Vec<CommandSpec> {
    let mut commands = Vec::new();
    if applet.pull {
        commands.push(CommandSpec::new(&options.runtime, compile_pull(applet)));
    }
    if applet.kill {
        commands.push(CommandSpec::new(&options.runtime, compile_kill(applet)).silent());
    }
    commands.push(CommandSpec::new(
        &options.runtime,
        compile_run(applet, extra_args, options),
    ));
    commands
}

/// Resolve `applet` and its transitive hooks into an ordered command list.
///
/// `applet` need not be the table's own record; invocation overrides are
/// applied to a copy before resolving. Hooks are always looked up in
/// `table` and run without extra arguments.
pub fn resolve(
    applet: &Applet,
    table: &AppletTable,
    extra_args: &[String],
    options: &CompileOptions,
) -> Result<Vec<CommandSpec>> {
    let mut visited = HashSet::new();
    let mut commands = Vec::new();

    walk(applet, table, extra_args, &mut visited, &mut |node, extra| {
        trace!(applet = %node.applet_name, "expanding applet");
        commands.extend(applet_commands(node, extra, options));
    })?;

    debug!(
        applet = %applet.applet_name,
        commands = commands.len(),
        "resolved hook graph"
    );
    Ok(commands)
}

/// Check every applet in the table for cycles and dangling hooks.
pub fn validate_graph(table: &AppletTable) -> Result<()> {
    for applet in table.applets.values() {
        let mut visited = HashSet::new();
        walk(applet, table, &[], &mut visited, &mut |_, _| {})?;
    }
    Ok(())
}

/// Applets reached when resolving `applet`, in execution order.
pub fn closure<'a>(applet: &'a Applet, table: &'a AppletTable) -> Result<Vec<&'a Applet>> {
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    walk(applet, table, &[], &mut visited, &mut |node, _| nodes.push(node))?;
    Ok(nodes)
}

/// Named-volume part of a `-v` spec (`data:/data` -> `data`).
fn volume_source(spec: &str) -> &str {
    spec.split(':').next().unwrap_or(spec)
}

/// Creation commands for declared resources the invocation needs.
///
/// Every declared network is created; a declared volume is created only
/// when an applet in `nodes` mounts it. Each resource appears once.
fn resource_commands(table: &AppletTable, nodes: &[&Applet], options: &CompileOptions) -> Vec<CommandSpec> {
    let mut commands = Vec::new();

    for (key, network) in &table.networks {
        commands.push(create_command("network", key, network, options));
    }

    let mut created = HashSet::new();
    for node in nodes {
        for spec in &node.volumes {
            let source = volume_source(spec);
            let declared = table
                .volumes
                .iter()
                .find(|(key, volume)| key.as_str() == source || volume.name == source);
            if let Some((key, volume)) = declared
                && created.insert(key.clone())
            {
                commands.push(create_command("volume", key, volume, options));
            }
        }
    }

    commands
}

fn create_command(
    kind: &str,
    key: &str,
    resource: &super::Resource,
    options: &CompileOptions,
) -> CommandSpec {
    let mut args = vec![kind.to_string(), "create".to_string()];
    if let Some(driver) = resource.driver.as_deref().filter(|d| !d.is_empty()) {
        args.push("--driver".to_string());
        args.push(driver.to_string());
    }
    let name = if resource.name.is_empty() {
        key
    } else {
        &resource.name
    };
    args.push(name.to_string());
    // "already exists" failures are expected on every run after the first.
    CommandSpec::new(&options.runtime, args).silent()
}

/// Full command list for one invocation: resource creation, then the
/// resolved hook graph.
pub fn plan_invocation(
    applet: &Applet,
    table: &AppletTable,
    extra_args: &[String],
    options: &CompileOptions,
) -> Result<Vec<CommandSpec>> {
    let nodes = closure(applet, table)?;
    let mut commands = resource_commands(table, &nodes, options);
    commands.extend(resolve(applet, table, extra_args, options)?);
    Ok(commands)
}
