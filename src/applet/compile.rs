//! Field-to-flag compiler.
//!
//! Turns an [`Applet`] into the argument list of a single container CLI
//! sub-command (`run`, `pull` or `kill`). Flag order is fixed by
//! [`RUN_FLAGS`]; scripts that wrap applets rely on the positions, so the
//! table must only ever be appended to with care.

use is_terminal::IsTerminal;
use std::fmt;
use std::str::FromStr;

use super::Applet;

/// How extra invocation arguments interact with an applet's `command`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingArgs {
    /// Extra arguments replace the configured command.
    #[default]
    Replace,
    /// The configured command is always emitted; extra arguments follow it.
    Append,
}

impl FromStr for TrailingArgs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(TrailingArgs::Replace),
            "append" => Ok(TrailingArgs::Append),
            other => Err(format!(
                "invalid trailing args mode '{other}' (expected 'replace' or 'append')"
            )),
        }
    }
}

impl fmt::Display for TrailingArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailingArgs::Replace => write!(f, "replace"),
            TrailingArgs::Append => write!(f, "append"),
        }
    }
}

/// Inputs to compilation that do not come from the applet itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Container CLI placed in front of every command.
    pub runtime: String,
    /// Whether stdin is attached to an interactive terminal.
    pub stdin_is_terminal: bool,
    pub trailing: TrailingArgs,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            stdin_is_terminal: false,
            trailing: TrailingArgs::default(),
        }
    }
}

impl CompileOptions {
    /// Options for the current process, probing stdin for a terminal.
    pub fn detect(runtime: impl Into<String>, trailing: TrailingArgs) -> Self {
        Self {
            runtime: runtime.into(),
            stdin_is_terminal: std::io::stdin().is_terminal(),
            trailing,
        }
    }
}

/// How a field turns into tokens.
enum Render {
    /// `flag value` when the value is non-empty.
    Scalar(fn(&Applet) -> &str),
    /// `flag` when the predicate holds.
    Switch(fn(&Applet, &CompileOptions) -> bool),
    /// `flag value` once per element, in order.
    Repeated(fn(&Applet) -> &[String]),
}

struct FlagRule {
    flag: &'static str,
    render: Render,
}

impl FlagRule {
    fn emit(&self, applet: &Applet, options: &CompileOptions, tokens: &mut Vec<String>) {
        match &self.render {
            Render::Scalar(get) => {
                let value = get(applet);
                if !value.is_empty() {
                    tokens.push(self.flag.to_string());
                    tokens.push(value.to_string());
                }
            }
            Render::Switch(enabled) => {
                if enabled(applet, options) {
                    tokens.push(self.flag.to_string());
                }
            }
            Render::Repeated(get) => {
                for value in get(applet) {
                    tokens.push(self.flag.to_string());
                    tokens.push(value.clone());
                }
            }
        }
    }
}

/// `run` flags in emission order.
const RUN_FLAGS: &[FlagRule] = &[
    FlagRule {
        flag: "--name",
        render: Render::Scalar(|a| a.name.as_str()),
    },
    FlagRule {
        flag: "--workdir",
        render: Render::Scalar(|a| a.work_dir.as_str()),
    },
    FlagRule {
        flag: "--entrypoint",
        render: Render::Scalar(|a| a.entrypoint.as_str()),
    },
    FlagRule {
        flag: "--restart",
        render: Render::Scalar(|a| a.restart.as_str()),
    },
    FlagRule {
        flag: "--network",
        render: Render::Scalar(|a| a.network.as_str()),
    },
    FlagRule {
        flag: "--hostname",
        render: Render::Scalar(|a| a.hostname.as_str()),
    },
    FlagRule {
        flag: "--rm",
        render: Render::Switch(|a, _| a.rm),
    },
    FlagRule {
        flag: "--privileged",
        render: Render::Switch(|a, _| a.privileged),
    },
    FlagRule {
        flag: "--detach",
        render: Render::Switch(|a, _| a.detach),
    },
    FlagRule {
        flag: "--interactive",
        render: Render::Switch(|a, _| a.interactive),
    },
    FlagRule {
        flag: "--tty",
        render: Render::Switch(|a, o| o.stdin_is_terminal && a.tty),
    },
    FlagRule {
        flag: "--dns",
        render: Render::Repeated(|a| a.dns.as_slice()),
    },
    FlagRule {
        flag: "--dns-search",
        render: Render::Repeated(|a| a.dns_search.as_slice()),
    },
    FlagRule {
        flag: "--dns-option",
        render: Render::Repeated(|a| a.dns_option.as_slice()),
    },
    FlagRule {
        flag: "-e",
        render: Render::Repeated(|a| a.environment.as_slice()),
    },
    FlagRule {
        flag: "-v",
        render: Render::Repeated(|a| a.volumes.as_slice()),
    },
    // Network attachments precede published ports.
    FlagRule {
        flag: "--network",
        render: Render::Repeated(|a| a.networks.as_slice()),
    },
    FlagRule {
        flag: "-p",
        render: Render::Repeated(|a| a.ports.as_slice()),
    },
    FlagRule {
        flag: "--env-file",
        render: Render::Repeated(|a| a.env_file.as_slice()),
    },
    FlagRule {
        flag: "--link",
        render: Render::Repeated(|a| a.links.as_slice()),
    },
];

/// Compile the `run` sub-command for an applet.
///
/// `extra_args` are the positional arguments supplied at invocation time.
/// Whether they replace or follow the applet's `command` is decided by
/// [`CompileOptions::trailing`].
pub fn compile_run(applet: &Applet, extra_args: &[String], options: &CompileOptions) -> Vec<String> {
    let mut tokens = vec!["run".to_string()];

    for rule in RUN_FLAGS {
        rule.emit(applet, options, &mut tokens);
    }

    tokens.push(applet.image_ref());

    let emit_command = match options.trailing {
        TrailingArgs::Replace => extra_args.is_empty(),
        TrailingArgs::Append => true,
    };
    if emit_command {
        tokens.extend(applet.command.iter().cloned());
    }
    tokens.extend(extra_args.iter().cloned());

    tokens
}

/// Compile the `pull` sub-command for an applet's image.
pub fn compile_pull(applet: &Applet) -> Vec<String> {
    vec!["pull".to_string(), applet.image_ref()]
}

/// Compile the `kill` sub-command targeting an applet's container.
pub fn compile_kill(applet: &Applet) -> Vec<String> {
    vec!["kill".to_string(), applet.container_name().to_string()]
}
