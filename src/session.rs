//! Per-process session state.
//!
//! Captures the settings and working directory that every command needs,
//! and knows how to assemble the applet table for them.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::applet::AppletTable;
use crate::cache::Cache;
use crate::manifest::{self, Fragment};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    /// Directory fragment discovery starts from.
    pub cwd: PathBuf,
}

impl Session {
    pub fn new(settings: Settings, cwd: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            cwd: cwd.into(),
        }
    }

    /// Session for the current process environment and directory.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::from_env()?;
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        debug!(
            root_dir = %settings.root_dir.display(),
            cwd = %cwd.display(),
            "session created"
        );
        Ok(Self::new(settings, cwd))
    }

    /// All fragments for this session: cached registry fragments first, then
    /// the files found by discovery.
    pub fn fragments(&self) -> Result<Vec<Fragment>> {
        let cache = Cache::load(&self.settings.cache_path())?;
        let mut fragments = cache.to_fragments()?;

        for path in manifest::discover(&self.settings.root_dir, &self.cwd) {
            let fragment = manifest::read_fragment(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            fragments.push(fragment);
        }

        debug!(count = fragments.len(), "collected fragments");
        Ok(fragments)
    }

    /// The merged and validated applet table.
    pub fn load_table(&self) -> Result<AppletTable> {
        let table = manifest::load(self.fragments()?).context("Failed to load applets")?;
        debug!(applets = table.applets.len(), "loaded applet table");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedFragment;
    use std::fs;
    use tempfile::TempDir;

    fn session(tmp: &TempDir) -> Session {
        let root = tmp.path().join("root");
        let cwd = tmp.path().join("project");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&cwd).unwrap();
        let settings = Settings {
            root_dir: root.clone(),
            install_dir: root.join("bin"),
            separator: "--".into(),
            runtime: "docker".into(),
            trailing: Default::default(),
        };
        Session::new(settings, cwd)
    }

    #[test]
    fn cache_precedes_discovered_files() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);

        Cache {
            updated_at: None,
            fragments: vec![CachedFragment {
                origin: "team (https://x.io/team.dbx.yaml)".into(),
                content: "applets:\n  web:\n    image: nginx\n    ports: [\"80:80\"]\n".into(),
            }],
        }
        .save(&session.settings.cache_path())
        .unwrap();
        fs::write(
            session.cwd.join("local.dbx.yaml"),
            "applets:\n  web:\n    ports: [\"8080:80\"]\n",
        )
        .unwrap();

        let table = session.load_table().unwrap();
        assert_eq!(table.get("web").unwrap().ports, vec!["80:80", "8080:80"]);
    }

    #[test]
    fn broken_local_file_names_its_path() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        fs::write(session.cwd.join("bad.dbx.yaml"), "applets: [").unwrap();

        let err = session.load_table().unwrap_err();
        assert!(format!("{err:#}").contains("bad.dbx.yaml"));
    }
}
