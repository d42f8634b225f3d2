//! CLI command implementations.

pub mod completions;
pub mod debug;
pub mod install;
pub mod list;
pub mod registry;
pub mod run;
pub mod schema;
pub mod update;
pub mod version;
