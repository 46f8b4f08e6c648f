//! Removal of previously generated pages.
//!
//! Every page is written as `index.html`, either at the output root or as
//! the only generated file of its own directory. Cleaning removes the root
//! file and whole page directories, leaving everything else in the output
//! directory (stylesheets, images) alone. Hidden directories are cleaned
//! like any other.

use std::path::{Path, PathBuf};

use super::paths::INDEX_HTML;
use super::walk::{self, WalkError};

#[derive(thiserror::Error, Debug)]
pub enum CleanError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Remove generated pages from `output_dir`.
///
/// Returns the number of files and directories removed. A missing output
/// directory is treated as already clean.
pub fn clean_output(output_dir: &Path) -> Result<usize, CleanError> {
    if !output_dir.is_dir() {
        return Ok(0);
    }

    // Collect first, delete afterwards: removing directories mid-walk would
    // pull entries out from under the walker.
    let mut root_files = Vec::new();
    let mut page_dirs = Vec::new();
    for file in walk::all_files(output_dir)? {
        if file.file_name().is_none_or(|name| name != INDEX_HTML) {
            continue;
        }
        match file.parent() {
            Some(dir) if dir == output_dir => root_files.push(file),
            Some(dir) => page_dirs.push(dir.to_path_buf()),
            None => {}
        }
    }

    // Sorted, an ancestor precedes its descendants; those are removed with it.
    page_dirs.sort();
    let mut removed_dirs: Vec<PathBuf> = Vec::new();
    for dir in page_dirs {
        if removed_dirs.iter().any(|removed| dir.starts_with(removed)) {
            continue;
        }
        remove(&dir, |p| std::fs::remove_dir_all(p))?;
        tracing::debug!(dir = %dir.display(), "removed page directory");
        removed_dirs.push(dir);
    }

    for file in &root_files {
        remove(file, |p| std::fs::remove_file(p))?;
    }

    for dir in &removed_dirs {
        prune_empty_parents(dir, output_dir)?;
    }

    Ok(root_files.len() + removed_dirs.len())
}

/// Remove directories left empty between `removed` and `output_dir`.
fn prune_empty_parents(removed: &Path, output_dir: &Path) -> Result<(), CleanError> {
    let mut current = removed.parent();
    while let Some(dir) = current {
        if dir == output_dir || !dir.starts_with(output_dir) || !is_empty_dir(dir) {
            break;
        }
        remove(dir, |p| std::fs::remove_dir(p))?;
        current = dir.parent();
    }
    Ok(())
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none())
}

fn remove(path: &Path, op: fn(&Path) -> std::io::Result<()>) -> Result<(), CleanError> {
    op(path).map_err(|source| CleanError::Remove {
        path: path.to_path_buf(),
        source,
    })
}
