//! dockerbox - run containers as if they were native executables
//!
//! Applets are named container launch profiles declared in YAML fragments.
//! Symlinking an applet name to the dockerbox binary turns it into a
//! command: invoking the link merges every fragment into one applet table,
//! expands the applet's hook graph, compiles each applet into container CLI
//! arguments and runs the result.
//!
//! ## Pipeline
//!
//! - [`manifest`]: fragment discovery, env substitution, unification
//! - [`applet::resolve`]: hook-graph expansion with cycle detection
//! - [`applet::compile`]: field-to-flag compilation
//! - [`executor`]: sequential execution with exit-code mirroring

pub mod applet;
pub mod cache;
pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod error;
pub mod executor;
pub mod install;
pub mod invocation;
pub mod manifest;
pub mod output;
pub mod registry;
pub mod session;
pub mod settings;

pub use applet::{Applet, AppletTable, CommandSpec};
pub use cli::{Cli, Commands};
pub use error::{DockerboxError, Result};
