//! Applet symlink management.
//!
//! Installing an applet creates `install_dir/<applet>` as a symlink to the
//! dockerbox executable; invoking the link runs the applet.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the link for `applet`.
pub fn link_path(install_dir: &Path, applet: &str) -> PathBuf {
    install_dir.join(applet)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Link `applet` to `exe`, replacing an existing link.
///
/// The install directory is created on demand. A regular file in the way
/// is left alone and reported as an error.
pub fn install(exe: &Path, install_dir: &Path, applet: &str) -> Result<PathBuf> {
    fs::create_dir_all(install_dir)
        .with_context(|| format!("Failed to create directory {}", install_dir.display()))?;

    let link = link_path(install_dir, applet);
    if is_symlink(&link) {
        fs::remove_file(&link)
            .with_context(|| format!("Failed to replace {}", link.display()))?;
    } else if link.exists() {
        bail!("{} exists and is not a symlink", link.display());
    }

    std::os::unix::fs::symlink(exe, &link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), exe.display()))?;
    debug!(link = %link.display(), target = %exe.display(), "installed applet");
    Ok(link)
}

/// Remove the link for `applet`. Returns false when there was none.
pub fn uninstall(install_dir: &Path, applet: &str) -> Result<bool> {
    let link = link_path(install_dir, applet);
    if !is_symlink(&link) {
        if link.exists() {
            bail!("{} exists and is not a symlink", link.display());
        }
        return Ok(false);
    }
    fs::remove_file(&link).with_context(|| format!("Failed to remove {}", link.display()))?;
    debug!(link = %link.display(), "uninstalled applet");
    Ok(true)
}
