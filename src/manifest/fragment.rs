//! Fragment schema and parsing.
//!
//! A fragment is one YAML document contributing applets, volumes, networks
//! and ignore entries. Every field is optional so that several fragments
//! can describe the same applet; the closed schema rejects unknown keys at
//! every level.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

use super::envsubst;
use crate::error::{DockerboxError, Result};

/// Top-level keys accepted in a fragment.
const TOP_LEVEL_KEYS: &[&str] = &["applets", "volumes", "networks", "ignore"];

/// A single applet as written in one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AppletFragment {
    /// Explicit applet name; must match the mapping key when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applet_name: Option<String>,
    /// Container name passed as `--name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Container image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Container image tag (default "latest")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    /// Overwrite the default ENTRYPOINT of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    /// Working directory inside the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,
    /// Container host name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Restart policy to apply when a container exits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    /// Primary network (`--network` emitted with the scalar flags)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Automatically remove the container when it exits (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rm: Option<bool>,
    /// Keep STDIN open even if not attached (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    /// Allocate a pseudo-TTY when stdin is a terminal (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detach: Option<bool>,
    /// Kill a previous container with the same name first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill: Option<bool>,
    /// Pull the image before running it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_option: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_file: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// Additional networks to attach
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    /// Applets to run before this one, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_hooks: Vec<String>,
    /// Applets to run after this one, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_hooks: Vec<String>,
    /// Command to run in the container; not concatenated across fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// A declared volume or network as written in one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResourceFragment {
    /// Resource name (defaults to the key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// The document schema of a `*.dbx.yaml` fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FragmentDoc {
    #[serde(default)]
    pub applets: BTreeMap<String, AppletFragment>,
    #[serde(default)]
    pub volumes: BTreeMap<String, ResourceFragment>,
    #[serde(default)]
    pub networks: BTreeMap<String, ResourceFragment>,
    /// Applets skipped by `install --all` and `uninstall --all`
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// A parsed fragment and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// File path, URL or other label used in error messages.
    pub origin: String,
    pub doc: FragmentDoc,
}

impl Fragment {
    /// Parse fragment text, expanding variables from the process environment.
    pub fn parse(origin: impl Into<String>, content: &str) -> Result<Self> {
        Self::parse_with_env(origin, content, &envsubst::process_env)
    }

    /// Parse fragment text, expanding variables with `lookup`.
    pub fn parse_with_env<F>(origin: impl Into<String>, content: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let origin = origin.into();
        let mut value: Value = serde_yaml::from_str(content)
            .map_err(|e| DockerboxError::validation(&origin, "<document>", e.to_string()))?;
        envsubst::expand_value(&mut value, lookup);
        let doc = decode_doc(&origin, value)?;
        Ok(Self { origin, doc })
    }
}

fn decode_doc(origin: &str, value: Value) -> Result<FragmentDoc> {
    let map = match value {
        Value::Null => return Ok(FragmentDoc::default()),
        Value::Mapping(map) => map,
        other => {
            return Err(DockerboxError::validation(
                origin,
                "<document>",
                format!("expected a mapping, found {}", kind_of(&other)),
            ));
        }
    };

    let mut doc = FragmentDoc::default();
    for (key, value) in map {
        let key = match key {
            Value::String(key) => key,
            other => {
                return Err(DockerboxError::validation(
                    origin,
                    "<document>",
                    format!("expected string keys, found {}", kind_of(&other)),
                ));
            }
        };
        match key.as_str() {
            "applets" => doc.applets = decode_entries(origin, "applets", value)?,
            "volumes" => doc.volumes = decode_entries(origin, "volumes", value)?,
            "networks" => doc.networks = decode_entries(origin, "networks", value)?,
            "ignore" => doc.ignore = decode_field(origin, "ignore", value)?,
            other => {
                return Err(DockerboxError::validation(
                    origin,
                    other,
                    format!(
                        "unknown field, expected one of: {}",
                        TOP_LEVEL_KEYS.join(", ")
                    ),
                ));
            }
        }
    }
    Ok(doc)
}

/// Decode a `name -> entry` section, one entry at a time so errors carry
/// the entry path. A null entry is an entry with every field unset.
fn decode_entries<T>(origin: &str, section: &str, value: Value) -> Result<BTreeMap<String, T>>
where
    T: DeserializeOwned + Default,
{
    let map = match value {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(map) => map,
        other => {
            return Err(DockerboxError::validation(
                origin,
                section,
                format!("expected a mapping, found {}", kind_of(&other)),
            ));
        }
    };

    let mut entries = BTreeMap::new();
    for (key, value) in map {
        let name = match key {
            Value::String(name) if !name.is_empty() => name,
            Value::String(_) => {
                return Err(DockerboxError::validation(origin, section, "empty name"));
            }
            other => {
                return Err(DockerboxError::validation(
                    origin,
                    section,
                    format!("expected a string name, found {}", kind_of(&other)),
                ));
            }
        };
        let path = format!("{section}.{name}");
        let entry = match value {
            Value::Null => T::default(),
            value => decode_field(origin, &path, value)?,
        };
        entries.insert(name, entry);
    }
    Ok(entries)
}

fn decode_field<T: DeserializeOwned>(origin: &str, path: &str, value: Value) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| DockerboxError::validation(origin, path, e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_full_fragment() {
        let fragment = Fragment::parse_with_env(
            "base.dbx.yaml",
            r#"
applets:
  web:
    image: nginx
    image_tag: "1.25"
    ports: ["8080:80"]
    rm: false
    command: [nginx, -g, "daemon off;"]
volumes:
  data:
    driver: local
networks:
  backend:
ignore: [web]
"#,
            &no_env,
        )
        .unwrap();

        let web = &fragment.doc.applets["web"];
        assert_eq!(web.image.as_deref(), Some("nginx"));
        assert_eq!(web.image_tag.as_deref(), Some("1.25"));
        assert_eq!(web.ports, vec!["8080:80"]);
        assert_eq!(web.rm, Some(false));
        assert_eq!(web.interactive, None);
        assert_eq!(web.command.as_ref().unwrap().len(), 3);
        assert_eq!(fragment.doc.volumes["data"].driver.as_deref(), Some("local"));
        assert_eq!(fragment.doc.networks["backend"], ResourceFragment::default());
        assert_eq!(fragment.doc.ignore, vec!["web"]);
    }

    #[test]
    fn empty_document_is_empty_fragment() {
        let fragment = Fragment::parse_with_env("empty.dbx.yaml", "", &no_env).unwrap();
        assert_eq!(fragment.doc, FragmentDoc::default());
    }

    #[test]
    fn unknown_applet_field_names_the_path() {
        let err = Fragment::parse_with_env(
            "bad.dbx.yaml",
            "applets:\n  web:\n    image: nginx\n    imagee: typo\n",
            &no_env,
        )
        .unwrap_err();

        match err {
            DockerboxError::ConfigValidation {
                origin,
                path,
                message,
            } => {
                assert_eq!(origin, "bad.dbx.yaml");
                assert_eq!(path, "applets.web");
                assert!(message.contains("imagee"), "{message}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let err = Fragment::parse_with_env("bad.dbx.yaml", "servces: {}\n", &no_env).unwrap_err();
        assert!(matches!(
            err,
            DockerboxError::ConfigValidation { ref path, .. } if path == "servces"
        ));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = Fragment::parse_with_env(
            "bad.dbx.yaml",
            "applets:\n  web:\n    rm: sometimes\n",
            &no_env,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("bad.dbx.yaml: applets.web:"));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = Fragment::parse_with_env("bad.dbx.yaml", "applets: [", &no_env).unwrap_err();
        assert!(matches!(err, DockerboxError::ConfigValidation { .. }));
    }

    #[test]
    fn variables_expand_before_decoding() {
        let lookup = |name: &str| (name == "TAG").then(|| "3.19".to_string());
        let fragment = Fragment::parse_with_env(
            "env.dbx.yaml",
            "applets:\n  sh:\n    image: alpine\n    image_tag: ${TAG}\n    environment: [\"HOME=${HOME:-/root}\"]\n",
            &lookup,
        )
        .unwrap();

        let sh = &fragment.doc.applets["sh"];
        assert_eq!(sh.image_tag.as_deref(), Some("3.19"));
        assert_eq!(sh.environment, vec!["HOME=/root"]);
    }
}
