//! Persisted cache of registry fragments.
//!
//! `update` fetches every registry source and stores the raw text in
//! `cache.yaml`. Raw text rather than merged applets is kept so that
//! environment substitution still happens per invocation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::manifest::{self, Fragment};
use crate::registry::Registry;

/// One cached fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedFragment {
    pub origin: String,
    pub content: String,
}

/// The `cache.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cache {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fragments: Vec<CachedFragment>,
}

impl Cache {
    /// Load the cache; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache from {}", path.display()))?;
        let cache: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse cache from {}", path.display()))?;
        Ok(cache)
    }

    /// Save the cache, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize cache")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write cache to {}", path.display()))?;
        Ok(())
    }

    /// Fetch every registry source, in registry order.
    ///
    /// The fetched fragments are parsed and unified before the cache is
    /// returned, so a broken source never replaces a working cache.
    pub fn refresh(registry: &Registry) -> Result<Self> {
        let mut fragments = Vec::with_capacity(registry.repos.len());
        for repo in &registry.repos {
            debug!(repo = %repo.name, path = %repo.path, kind = %repo.kind, "fetching");
            let content = repo.fetch()?;
            fragments.push(CachedFragment {
                origin: repo.origin(),
                content,
            });
        }

        let cache = Self {
            updated_at: Some(Utc::now()),
            fragments,
        };
        manifest::load(cache.to_fragments()?).context("Registry sources do not merge")?;
        Ok(cache)
    }

    /// Parse the cached text into fragments.
    pub fn to_fragments(&self) -> Result<Vec<Fragment>> {
        self.fragments
            .iter()
            .map(|cached| {
                Fragment::parse(cached.origin.clone(), &cached.content)
                    .with_context(|| format!("Cached fragment {} is invalid", cached.origin))
            })
            .collect()
    }
}
