//! Site loading: turn the pages directory into a [`Website`].
//!
//! Loading walks the layouts directory (layouts + partials) and the pages
//! directory, names every page, and resolves each page to a layout. Nothing
//! is written; the result is an immutable snapshot used by every render.

use std::path::{Path, PathBuf};

use crate::config::{TemplateConfig, WebsiteConfig};

use super::layouts::{LayoutRegistry, LayoutSources};
use super::paths::{output_path, page_name};
use super::walk::{self, WalkError};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("failed to parse partials in {dir}: {source}")]
    Partials { dir: PathBuf, source: tera::Error },

    #[error("failed to parse layout file {path}: {source}")]
    Layout { path: PathBuf, source: tera::Error },

    #[error("page {path} is not inside the pages directory {pages_dir}")]
    OutsidePages { path: PathBuf, pages_dir: PathBuf },
}

// =============================================================================
// Website and pages
// =============================================================================

/// One content template mapped to one HTML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Site-relative output path, e.g. `blog/post1/index.html`
    pub name: String,
    /// Name of the layout this page renders through, e.g. `blog.tmpl`
    pub layout: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Everything needed to render the site.
#[derive(Debug)]
pub struct Website {
    pub output_dir: PathBuf,
    pub layouts: LayoutRegistry,
    /// Files the layout registry was parsed from
    pub layout_sources: LayoutSources,
    /// Pages in directory-walk order
    pub pages: Vec<Page>,
}

impl Website {
    /// Load the website described by `config` from disk.
    pub fn load(config: &WebsiteConfig) -> Result<Self, LoadError> {
        let templates = &config.templates;

        // Step 1: Layouts and partials
        let layout_files = template_files(&config.layouts_dir, &[], &templates.extension)?;
        let layout_sources = LayoutSources::partition(layout_files, &templates.partial_prefix);
        let layouts = LayoutRegistry::load(&layout_sources)?;
        if layouts.is_empty() {
            tracing::warn!(dir = %config.layouts_dir.display(), "no layouts found");
        }

        // Step 2: Pages, excluding the layouts directory
        let page_files = template_files(
            &config.pages_dir,
            &[config.layouts_dir.as_path()],
            &templates.extension,
        )?;

        let pages = page_files
            .into_iter()
            .map(|input_path| -> Result<Page, LoadError> {
                let name = page_name(&input_path, &config.pages_dir).ok_or_else(|| {
                    LoadError::OutsidePages {
                        path: input_path.clone(),
                        pages_dir: config.pages_dir.clone(),
                    }
                })?;
                let layout = resolve_layout(&input_path, &config.pages_dir, templates, |name| {
                    layouts.contains(name)
                });
                tracing::debug!(page = %name, layout = %layout, "discovered page");

                Ok(Page {
                    output_path: output_path(&config.output_dir, &name),
                    name,
                    layout,
                    input_path,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            output_dir: config.output_dir.clone(),
            layouts,
            layout_sources,
            pages,
        })
    }
}

/// Pick the layout for a page.
///
/// In order: a layout sharing the page's file name, a layout named after the
/// page's directory (pages in a subdirectory only), the default layout.
pub fn resolve_layout(
    page: &Path,
    pages_dir: &Path,
    templates: &TemplateConfig,
    is_layout: impl Fn(&str) -> bool,
) -> String {
    if let Some(file_name) = page.file_name().map(|n| n.to_string_lossy())
        && is_layout(&*file_name)
    {
        return file_name.into_owned();
    }

    let parent_dir = page
        .strip_prefix(pages_dir)
        .ok()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .map(|n| format!("{}{}", n.to_string_lossy(), templates.extension));
    if let Some(dir_layout) = parent_dir
        && is_layout(dir_layout.as_str())
    {
        return dir_layout;
    }

    templates.default_layout.clone()
}

fn template_files(
    dir: &Path,
    skip: &[&Path],
    extension: &str,
) -> Result<Vec<PathBuf>, WalkError> {
    let mut files = walk::files(dir, skip)?;
    files.retain(|path| {
        path.file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(extension))
    });
    Ok(files)
}
