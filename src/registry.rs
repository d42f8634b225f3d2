//! The registry of remote and local fragment sources.
//!
//! Stored as `registry.yaml` in the root directory:
//!
//! ```yaml
//! repos:
//!   - name: team
//!     path: https://example.com/team.dbx.yaml
//!     type: url
//!   - name: local
//!     path: $HOME/boxes/local.dbx.yaml
//!     type: file
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::DockerboxError;
use crate::manifest::envsubst;

/// Where a repo's fragment is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A local file; the path may reference environment variables
    File,
    /// An HTTP(S) URL
    Url,
}

impl SourceKind {
    /// Guess the kind from the path: `http://` and `https://` are URLs.
    pub fn infer(path: &str) -> Self {
        if path.starts_with("http://") || path.starts_with("https://") {
            SourceKind::Url
        } else {
            SourceKind::File
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => write!(f, "file"),
            SourceKind::Url => write!(f, "url"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = DockerboxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file" => Ok(SourceKind::File),
            "url" => Ok(SourceKind::Url),
            other => Err(DockerboxError::Registry(format!(
                "unsupported repo type '{other}' (expected 'file' or 'url')"
            ))),
        }
    }
}

/// One registered fragment source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

impl RepoEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: Option<SourceKind>) -> Self {
        let path = path.into();
        let kind = kind.unwrap_or_else(|| SourceKind::infer(&path));
        Self {
            name: name.into(),
            path,
            kind,
        }
    }

    /// Fetch the raw fragment text.
    pub fn fetch(&self) -> crate::error::Result<String> {
        match self.kind {
            SourceKind::File => {
                let path = envsubst::expand(&self.path, &envsubst::process_env);
                fs::read_to_string(&path).map_err(|e| DockerboxError::Fetch {
                    source_name: self.name.clone(),
                    message: format!("{path}: {e}"),
                })
            }
            SourceKind::Url => download(&self.path).map_err(|message| DockerboxError::Fetch {
                source_name: self.name.clone(),
                message,
            }),
        }
    }

    /// Label used as the fragment origin.
    pub fn origin(&self) -> String {
        format!("{} ({})", self.name, self.path)
    }
}

fn download(url: &str) -> std::result::Result<String, String> {
    let mut body = String::new();
    ureq::get(url)
        .call()
        .map_err(|e| format!("{url}: {e}"))?
        .body_mut()
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| format!("{url}: {e}"))?;
    Ok(body)
}

/// The `registry.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

impl Registry {
    /// Load the registry; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry from {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let registry: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse registry from {}", path.display()))?;
        Ok(registry)
    }

    /// Save the registry, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize registry")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write registry to {}", path.display()))?;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&RepoEntry> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Add a repo or replace the one with the same name, keeping its position.
    pub fn upsert(&mut self, entry: RepoEntry) {
        if let Some(existing) = self.repos.iter_mut().find(|r| r.name == entry.name) {
            *existing = entry;
        } else {
            self.repos.push(entry);
        }
    }

    /// Remove a repo by name. Returns true if removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let len_before = self.repos.len();
        self.repos.retain(|r| r.name != name);
        self.repos.len() < len_before
    }
}
