//! Path conversion utilities.
//!
//! This module handles conversions between:
//! - Page source paths (template files under the pages directory)
//! - Page names (the site-relative output path, e.g. `about/index.html`)
//! - Output file paths (where files are written in the output directory)

use std::path::{Component, Path, PathBuf};

/// File name every rendered page is written to.
pub const INDEX_HTML: &str = "index.html";

/// Convert a page template path to its canonical page name.
///
/// Returns `None` if `page` is not inside `pages_dir`.
///
/// # Examples
/// ```ignore
/// page_name("pages/about.tmpl", "pages") => "about/index.html"
/// page_name("pages/index.tmpl", "pages") => "index.html"
/// page_name("pages/blog/index.tmpl", "pages") => "blog/index/index.html"
/// page_name("pages/blog/posts/post1.tmpl", "pages") => "blog/posts/post1/index.html"
/// ```
pub fn page_name(page: &Path, pages_dir: &Path) -> Option<String> {
    let relative = page.strip_prefix(pages_dir).ok()?;
    let stem = relative.with_extension("");

    let mut segments: Vec<String> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    // Only the root index maps onto the output root; every other page owns
    // a directory of its own
    if segments.is_empty() || segments == ["index"] {
        return Some(INDEX_HTML.to_string());
    }

    segments.push(INDEX_HTML.to_string());
    Some(segments.join("/"))
}

/// Convert a page name to its output file path.
///
/// Joins the `/`-separated name segment by segment so the result uses the
/// platform separator.
pub fn output_path(output_dir: &Path, name: &str) -> PathBuf {
    name.split('/')
        .filter(|s| !s.is_empty())
        .fold(output_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Returns true if the file name of `path` ends with one of `extensions`.
/// An empty extension list matches every file.
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}
