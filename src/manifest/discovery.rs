//! Fragment discovery on the local filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File suffixes recognised as fragments.
pub const FRAGMENT_SUFFIXES: &[&str] = &[".dbx.yaml", ".dbx.yml"];

/// Whether `path` names a fragment file.
pub fn is_fragment(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            FRAGMENT_SUFFIXES
                .iter()
                .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
        })
}

/// Fragments directly inside `dir`, sorted by file name.
fn fragments_in(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_fragment(path))
        .collect();
    files.sort();
    files
}

/// Ordered list of fragment files for an invocation.
///
/// `root_dir` comes first, then `cwd` and each of its ancestors, stopping
/// before the filesystem root. A directory visited twice (for example when
/// `cwd` is inside `root_dir`) contributes its files only once.
pub fn discover(root_dir: &Path, cwd: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<&Path> = vec![root_dir];
    for dir in cwd.ancestors() {
        if dir.parent().is_none() {
            break;
        }
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    let files: Vec<PathBuf> = dirs.into_iter().flat_map(fragments_in).collect();
    debug!(count = files.len(), "discovered fragments");
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn recognises_fragment_suffixes() {
        assert!(is_fragment(Path::new("/x/web.dbx.yaml")));
        assert!(is_fragment(Path::new("tools.dbx.yml")));
        assert!(!is_fragment(Path::new("/x/web.yaml")));
        assert!(!is_fragment(Path::new("/x/.dbx.yaml")));
        assert!(!is_fragment(Path::new("/x/web.dbx.yaml.bak")));
    }

    #[test]
    fn root_dir_first_then_cwd_upward() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("home/.dockerbox");
        let project = tmp.path().join("work/project");
        let nested = project.join("src");

        touch(&root.join("b.dbx.yaml"));
        touch(&root.join("a.dbx.yaml"));
        touch(&root.join("notes.txt"));
        touch(&project.join("project.dbx.yml"));
        touch(&tmp.path().join("work/shared.dbx.yaml"));
        fs::create_dir_all(&nested).unwrap();

        let found = discover(&root, &nested);
        let expected = vec![
            root.join("a.dbx.yaml"),
            root.join("b.dbx.yaml"),
            project.join("project.dbx.yml"),
            tmp.path().join("work/shared.dbx.yaml"),
        ];
        // Ancestors above the temp dir may hold unrelated fragments.
        assert_eq!(&found[..expected.len()], expected.as_slice());
    }

    #[test]
    fn missing_root_dir_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let cwd = tmp.path().join("cwd");
        touch(&cwd.join("x.dbx.yaml"));

        let found = discover(&tmp.path().join("missing"), &cwd);
        assert_eq!(found.first(), Some(&cwd.join("x.dbx.yaml")));
    }

    #[test]
    fn cwd_equal_to_root_is_read_once() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("x.dbx.yaml"));

        let found = discover(tmp.path(), tmp.path());
        let count = found
            .iter()
            .filter(|p| *p == &tmp.path().join("x.dbx.yaml"))
            .count();
        assert_eq!(count, 1);
    }
}
