//! Invocation-time overrides.
//!
//! When an applet is invoked through its symlink, arguments before the
//! separator token are docker-style flags that adjust the applet for this
//! run only. Everything after the separator is passed to the container.

use clap::{CommandFactory, FromArgMatches, Parser};

use super::Applet;

/// Docker-style flags accepted before the separator.
#[derive(Debug, Default, Clone, PartialEq, Eq, Parser)]
#[command(no_binary_name = true)]
#[command(about = "Override applet settings for this invocation")]
pub struct AppletOverrides {
    /// Assign a name to the container
    #[arg(long)]
    pub name: Option<String>,

    /// Working directory inside the container
    #[arg(short = 'w', long = "workdir")]
    pub work_dir: Option<String>,

    /// Overwrite the default ENTRYPOINT of the image
    #[arg(long)]
    pub entrypoint: Option<String>,

    /// Restart policy to apply when a container exits
    #[arg(long)]
    pub restart: Option<String>,

    /// Container host name
    #[arg(long)]
    pub hostname: Option<String>,

    /// Container image
    #[arg(long)]
    pub image: Option<String>,

    /// Container image tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Automatically remove the container when it exits
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub rm: Option<bool>,

    /// Keep STDIN open even if not attached
    #[arg(short = 'i', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub interactive: Option<bool>,

    /// Allocate a pseudo-TTY
    #[arg(short = 't', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub tty: Option<bool>,

    /// Give extended privileges to this container
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub privileged: Option<bool>,

    /// Run container in background and print container ID
    #[arg(short = 'd', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub detach: Option<bool>,

    /// Kill a previous container with the same name first
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub kill: Option<bool>,

    /// Pull the image before running it
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pull: Option<bool>,

    /// Set environment variables
    #[arg(short = 'e', long = "env")]
    pub environment: Vec<String>,

    /// Bind mount a volume
    #[arg(short = 'v', long = "volume")]
    pub volumes: Vec<String>,

    /// Publish a container's port(s) to the host
    #[arg(short = 'p', long = "publish")]
    pub ports: Vec<String>,

    /// Connect the container to a network
    #[arg(long = "network")]
    pub networks: Vec<String>,

    /// Set custom DNS servers
    #[arg(long)]
    pub dns: Vec<String>,

    /// Set custom DNS search domains
    #[arg(long)]
    pub dns_search: Vec<String>,

    /// Set DNS options
    #[arg(long)]
    pub dns_option: Vec<String>,

    /// Read in a file of environment variables
    #[arg(long)]
    pub env_file: Vec<String>,

    /// Add link to another container
    #[arg(long = "link")]
    pub links: Vec<String>,

    /// Run another applet before this one
    #[arg(long = "before-hook")]
    pub before_hooks: Vec<String>,

    /// Run another applet after this one
    #[arg(long = "after-hook")]
    pub after_hooks: Vec<String>,
}

impl AppletOverrides {
    /// Parse override flags for the named applet.
    pub fn parse_for(applet_name: &str, flags: &[String]) -> Result<Self, clap::Error> {
        let matches = Self::command()
            .bin_name(applet_name.to_string())
            .try_get_matches_from(flags)?;
        Self::from_arg_matches(&matches)
    }

    /// Return a copy of `applet` with these overrides applied.
    ///
    /// Scalars and switches replace the configured value; repeated fields
    /// are appended after the configured entries. Hooks already configured
    /// are not added again.
    pub fn apply(&self, applet: &Applet) -> Applet {
        let mut out = applet.clone();

        let scalars = [
            (&self.name, &mut out.name),
            (&self.work_dir, &mut out.work_dir),
            (&self.entrypoint, &mut out.entrypoint),
            (&self.restart, &mut out.restart),
            (&self.hostname, &mut out.hostname),
            (&self.image, &mut out.image),
            (&self.tag, &mut out.tag),
        ];
        for (value, field) in scalars {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        let switches = [
            (self.rm, &mut out.rm),
            (self.interactive, &mut out.interactive),
            (self.tty, &mut out.tty),
            (self.privileged, &mut out.privileged),
            (self.detach, &mut out.detach),
            (self.kill, &mut out.kill),
            (self.pull, &mut out.pull),
        ];
        for (value, field) in switches {
            if let Some(value) = value {
                *field = value;
            }
        }

        let lists = [
            (&self.environment, &mut out.environment),
            (&self.volumes, &mut out.volumes),
            (&self.ports, &mut out.ports),
            (&self.networks, &mut out.networks),
            (&self.dns, &mut out.dns),
            (&self.dns_search, &mut out.dns_search),
            (&self.dns_option, &mut out.dns_option),
            (&self.env_file, &mut out.env_file),
            (&self.links, &mut out.links),
        ];
        for (extra, field) in lists {
            field.extend(extra.iter().cloned());
        }

        let hooks = [
            (&self.before_hooks, &mut out.before_hooks),
            (&self.after_hooks, &mut out.after_hooks),
        ];
        for (extra, field) in hooks {
            for hook in extra {
                if !field.contains(hook) {
                    field.push(hook.clone());
                }
            }
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Split invocation arguments at the first `separator`.
///
/// Returns `(flags, extra_args)`. Without a separator every argument is an
/// extra argument.
pub fn split_args(separator: &str, args: &[String]) -> (Vec<String>, Vec<String>) {
    match args.iter().position(|arg| arg == separator) {
        Some(idx) => (args[..idx].to_vec(), args[idx + 1..].to_vec()),
        None => (Vec::new(), args.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_without_separator_is_all_extra() {
        let (flags, extra) = split_args("--", &args(&["ls", "-la"]));
        assert!(flags.is_empty());
        assert_eq!(extra, args(&["ls", "-la"]));
    }

    #[test]
    fn split_at_first_separator() {
        let (flags, extra) = split_args("--", &args(&["--pull", "--", "sh", "--", "x"]));
        assert_eq!(flags, args(&["--pull"]));
        assert_eq!(extra, args(&["sh", "--", "x"]));
    }

    #[test]
    fn split_with_custom_separator() {
        let (flags, extra) = split_args("---", &args(&["--tty", "---", "my", "args"]));
        assert_eq!(flags, args(&["--tty"]));
        assert_eq!(extra, args(&["my", "args"]));
    }

    #[test]
    fn parse_switches_and_values() {
        let overrides = AppletOverrides::parse_for(
            "web",
            &args(&["--rm=false", "-d", "-e", "A=1", "--env", "B=2", "--tag", "1.2"]),
        )
        .unwrap();

        assert_eq!(overrides.rm, Some(false));
        assert_eq!(overrides.detach, Some(true));
        assert_eq!(overrides.environment, args(&["A=1", "B=2"]));
        assert_eq!(overrides.tag.as_deref(), Some("1.2"));
        assert_eq!(overrides.tty, None);
    }

    #[test]
    fn parse_rejects_unknown_flags() {
        let err = AppletOverrides::parse_for("web", &args(&["--invalid"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn empty_flags_parse_to_no_overrides() {
        let overrides = AppletOverrides::parse_for("web", &[]).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn apply_replaces_scalars_and_appends_lists() {
        let mut applet = Applet::new("web", "nginx");
        applet.ports = args(&["80:80"]);

        let overrides = AppletOverrides {
            image: Some("httpd".into()),
            rm: Some(false),
            ports: args(&["443:443"]),
            before_hooks: args(&["setup"]),
            ..Default::default()
        };
        let applied = overrides.apply(&applet);

        assert_eq!(applied.image, "httpd");
        assert!(!applied.rm);
        assert_eq!(applied.ports, args(&["80:80", "443:443"]));
        assert_eq!(applied.before_hooks, args(&["setup"]));
        // the source applet is untouched
        assert_eq!(applet.image, "nginx");
        assert!(applet.rm);
    }

    #[test]
    fn apply_skips_hooks_already_configured() {
        let mut applet = Applet::new("web", "nginx");
        applet.before_hooks = args(&["setup"]);

        let overrides = AppletOverrides {
            before_hooks: args(&["setup", "migrate"]),
            after_hooks: args(&["notify", "notify"]),
            ..Default::default()
        };
        let applied = overrides.apply(&applet);

        assert_eq!(applied.before_hooks, args(&["setup", "migrate"]));
        assert_eq!(applied.after_hooks, args(&["notify"]));
    }
}
