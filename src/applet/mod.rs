//! Applet types and the applet compiler.
//!
//! An [`Applet`] is a fully merged, defaulted, validated container launch
//! profile. Applets only come out of the manifest pipeline
//! ([`crate::manifest::load`]); the compiler ([`compile`]) and the resolver
//! ([`resolve`]) treat them as read-only.

pub mod compile;
pub mod overrides;
pub mod resolve;

pub use compile::{CompileOptions, TrailingArgs, compile_kill, compile_pull, compile_run};
pub use overrides::AppletOverrides;
pub use resolve::{plan_invocation, resolve, validate_graph};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Image tag applied when no fragment sets one.
pub const DEFAULT_TAG: &str = "latest";

/// A named container launch profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Applet {
    /// Identity of the applet (its key in the applet table).
    pub applet_name: String,
    /// Container name passed as `--name`.
    pub name: String,
    pub image: String,
    pub tag: String,
    pub entrypoint: String,
    pub work_dir: String,
    pub hostname: String,
    pub restart: String,
    pub network: String,

    pub rm: bool,
    pub interactive: bool,
    pub tty: bool,
    pub privileged: bool,
    pub detach: bool,
    pub kill: bool,
    pub pull: bool,

    pub dns: Vec<String>,
    pub dns_search: Vec<String>,
    pub dns_option: Vec<String>,
    pub environment: Vec<String>,
    pub env_file: Vec<String>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub links: Vec<String>,
    pub networks: Vec<String>,

    pub before_hooks: Vec<String>,
    pub after_hooks: Vec<String>,
    pub command: Vec<String>,
}

impl Applet {
    /// Create an applet with the documented defaults applied.
    pub fn new(applet_name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            applet_name: applet_name.into(),
            image: image.into(),
            tag: DEFAULT_TAG.to_string(),
            rm: true,
            interactive: true,
            tty: true,
            ..Default::default()
        }
    }

    /// Image reference as passed to the container CLI (`image:tag` or `image`).
    pub fn image_ref(&self) -> String {
        if self.tag.is_empty() {
            self.image.clone()
        } else {
            format!("{}:{}", self.image, self.tag)
        }
    }

    /// Name used to target the running container (`kill`).
    ///
    /// Falls back to the applet name when no container name is configured.
    pub fn container_name(&self) -> &str {
        if self.name.is_empty() {
            &self.applet_name
        } else {
            &self.name
        }
    }
}

/// A declared volume or network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// The validated set of applets and declared resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppletTable {
    pub applets: BTreeMap<String, Applet>,
    pub volumes: BTreeMap<String, Resource>,
    pub networks: BTreeMap<String, Resource>,
    pub ignore: BTreeSet<String>,
}

impl AppletTable {
    /// Look up an applet by name.
    pub fn get(&self, name: &str) -> Option<&Applet> {
        self.applets.get(name)
    }

    /// Whether the applet is excluded from bulk install/uninstall.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    /// Applet names eligible for `--all` operations, in name order.
    pub fn installable(&self) -> impl Iterator<Item = &str> {
        self.applets
            .keys()
            .map(String::as_str)
            .filter(|name| !self.is_ignored(name))
    }

    /// Insert an applet keyed by its name.
    pub fn insert(&mut self, applet: Applet) {
        self.applets.insert(applet.applet_name.clone(), applet);
    }
}

/// One external command: the container CLI and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// Suppress stdio and ignore failures.
    pub silent: bool,
    /// Program followed by its arguments.
    pub tokens: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(program.to_string());
        tokens.extend(args);
        Self {
            silent: false,
            tokens,
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-quoted rendering, safe to paste into a POSIX shell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .tokens
            .iter()
            .map(|token| match shlex::try_quote(token) {
                Ok(q) => q.into_owned(),
                Err(_) => format!("{token:?}"),
            })
            .collect();
        write!(f, "{}", quoted.join(" "))
    }
}
