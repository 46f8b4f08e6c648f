//! Recursive directory listing shared by the loader, cleaner and watcher.

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
#[error("failed to walk {path}: {source}")]
pub struct WalkError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// List every file under `dir`, depth-first, in name order.
///
/// Hidden files and directories are skipped, as is any directory listed in
/// `skip`.
pub fn files(dir: &Path, skip: &[&Path]) -> Result<Vec<PathBuf>, WalkError> {
    let mut out = Vec::new();
    walk_directory(dir, skip, false, &mut out)?;
    Ok(out)
}

/// List every file under `dir`, hidden ones included.
pub fn all_files(dir: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let mut out = Vec::new();
    walk_directory(dir, &[], true, &mut out)?;
    Ok(out)
}

fn walk_directory(
    dir: &Path,
    skip: &[&Path],
    include_hidden: bool,
    out: &mut Vec<PathBuf>,
) -> Result<(), WalkError> {
    let read_err = |source| WalkError {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        if !include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            if skip.contains(&path.as_path()) {
                continue;
            }
            walk_directory(&path, skip, include_hidden, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_files_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("b/skip")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("z.tmpl"), "").unwrap();
        std::fs::write(root.join("a.tmpl"), "").unwrap();
        std::fs::write(root.join(".hidden.tmpl"), "").unwrap();
        std::fs::write(root.join(".git/config"), "").unwrap();
        std::fs::write(root.join("b/c.tmpl"), "").unwrap();
        std::fs::write(root.join("b/skip/d.tmpl"), "").unwrap();

        let skip = root.join("b/skip");
        let found = files(root, &[skip.as_path()]).unwrap();
        assert_eq!(
            found,
            vec![root.join("a.tmpl"), root.join("b/c.tmpl"), root.join("z.tmpl")]
        );
    }

    #[test]
    fn test_all_files_includes_hidden() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join(".drafts")).unwrap();
        std::fs::write(root.join(".drafts/index.html"), "").unwrap();
        std::fs::write(root.join("index.html"), "").unwrap();

        assert_eq!(
            all_files(root).unwrap(),
            vec![root.join(".drafts/index.html"), root.join("index.html")]
        );
    }

    #[test]
    fn test_files_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = files(&missing, &[]).unwrap_err();
        assert_eq!(err.path, missing);
    }
}
