//! Applet manifests: fragment parsing, discovery and unification.
//!
//! Configuration arrives as any number of YAML fragments. Each is parsed on
//! its own (with environment substitution), then all of them are unified
//! into a single [`AppletTable`], defaulted and validated.

pub mod discovery;
pub mod envsubst;
pub mod fragment;
pub mod unify;

pub use discovery::discover;
pub use fragment::{AppletFragment, Fragment, FragmentDoc, ResourceFragment};

use std::fs;
use std::path::Path;

use crate::applet::AppletTable;
use crate::error::Result;

/// Merge and validate fragments into an applet table.
///
/// Fragments are unified in the order given.
pub fn load(fragments: Vec<Fragment>) -> Result<AppletTable> {
    unify::merge(fragments)
}

/// Read and parse a fragment file.
pub fn read_fragment(path: &Path) -> Result<Fragment> {
    let content = fs::read_to_string(path)?;
    Fragment::parse(path.display().to_string(), &content)
}
