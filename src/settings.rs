//! Environment-driven settings.
//!
//! Every knob comes from a `DOCKERBOX_*` variable with a default derived
//! from `$HOME`. Values may themselves reference variables (`$HOME/boxes`).

use anyhow::{Result, anyhow};
use directories::BaseDirs;
use std::path::PathBuf;

use crate::applet::{CompileOptions, TrailingArgs};
use crate::manifest::envsubst;

pub const ROOT_DIR_VAR: &str = "DOCKERBOX_ROOT_DIR";
pub const INSTALL_DIR_VAR: &str = "DOCKERBOX_INSTALL_DIR";
pub const SEPARATOR_VAR: &str = "DOCKERBOX_SEPARATOR";
pub const RUNTIME_VAR: &str = "DOCKERBOX_RUNTIME";
pub const TRAILING_ARGS_VAR: &str = "DOCKERBOX_TRAILING_ARGS";

pub const DEFAULT_SEPARATOR: &str = "--";
pub const DEFAULT_RUNTIME: &str = "docker";

/// Name of the registry file inside the root directory.
pub const REGISTRY_FILE: &str = "registry.yaml";
/// Name of the fragment cache inside the root directory.
pub const CACHE_FILE: &str = "cache.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Holds the registry, the cache and user fragments.
    pub root_dir: PathBuf,
    /// Where applet symlinks are installed.
    pub install_dir: PathBuf,
    /// Token separating override flags from container arguments.
    pub separator: String,
    /// Container CLI to invoke.
    pub runtime: String,
    pub trailing: TrailingArgs,
}

impl Settings {
    /// Settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Prefer $HOME for test isolation, fall back to BaseDirs
        let home = lookup("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|d| d.home_dir().to_path_buf()))
            .ok_or_else(|| anyhow!("Cannot determine home directory; set $HOME"))?;

        let value = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .map(|v| envsubst::expand(&v, &lookup))
        };

        let root_dir = value(ROOT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".dockerbox"));
        let install_dir = value(INSTALL_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".dockerbox").join("bin"));
        let separator = value(SEPARATOR_VAR).unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        let runtime = value(RUNTIME_VAR).unwrap_or_else(|| DEFAULT_RUNTIME.to_string());
        let trailing = match value(TRAILING_ARGS_VAR) {
            Some(mode) => mode
                .parse()
                .map_err(|e: String| anyhow!("{TRAILING_ARGS_VAR}: {e}"))?,
            None => TrailingArgs::default(),
        };

        Ok(Self {
            root_dir,
            install_dir,
            separator,
            runtime,
            trailing,
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root_dir.join(REGISTRY_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root_dir.join(CACHE_FILE)
    }

    /// Compile options for this process.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::detect(self.runtime.clone(), self.trailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_derive_from_home() {
        let settings = Settings::from_lookup(lookup(&[("HOME", "/home/me")])).unwrap();
        assert_eq!(settings.root_dir, PathBuf::from("/home/me/.dockerbox"));
        assert_eq!(settings.install_dir, PathBuf::from("/home/me/.dockerbox/bin"));
        assert_eq!(settings.separator, "--");
        assert_eq!(settings.runtime, "docker");
        assert_eq!(settings.trailing, TrailingArgs::Replace);
        assert_eq!(
            settings.registry_path(),
            PathBuf::from("/home/me/.dockerbox/registry.yaml")
        );
    }

    #[test]
    fn overrides_are_expanded() {
        let settings = Settings::from_lookup(lookup(&[
            ("HOME", "/home/me"),
            ("DOCKERBOX_ROOT_DIR", "$HOME/boxes"),
            ("DOCKERBOX_INSTALL_DIR", "/opt/bin"),
            ("DOCKERBOX_SEPARATOR", "---"),
            ("DOCKERBOX_RUNTIME", "podman"),
            ("DOCKERBOX_TRAILING_ARGS", "append"),
        ]))
        .unwrap();
        assert_eq!(settings.root_dir, PathBuf::from("/home/me/boxes"));
        assert_eq!(settings.install_dir, PathBuf::from("/opt/bin"));
        assert_eq!(settings.separator, "---");
        assert_eq!(settings.runtime, "podman");
        assert_eq!(settings.trailing, TrailingArgs::Append);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            ("HOME", "/home/me"),
            ("DOCKERBOX_SEPARATOR", ""),
        ]))
        .unwrap();
        assert_eq!(settings.separator, "--");
    }

    #[test]
    fn invalid_trailing_mode_is_an_error() {
        let err = Settings::from_lookup(lookup(&[
            ("HOME", "/home/me"),
            ("DOCKERBOX_TRAILING_ARGS", "merge"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DOCKERBOX_TRAILING_ARGS"));
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        // Rust 2024 requires unsafe for env mutation
        unsafe {
            std::env::set_var(RUNTIME_VAR, "podman");
            std::env::set_var(SEPARATOR_VAR, "::");
        }
        let settings = Settings::from_env();
        unsafe {
            std::env::remove_var(RUNTIME_VAR);
            std::env::remove_var(SEPARATOR_VAR);
        }

        let settings = settings.unwrap();
        assert_eq!(settings.runtime, "podman");
        assert_eq!(settings.separator, "::");
    }
}
