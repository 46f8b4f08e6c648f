use std::path::PathBuf;

use crate::config::WebsiteConfig;

use super::clean::{CleanError, clean_output};
use super::layouts::LayoutRegistry;
use super::render::{RenderError, render_site};
use super::site::{LoadError, Website};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("clean error: {0}")]
    Clean(#[from] CleanError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug)]
pub struct BuildResult {
    pub site: Website,
    /// Pages rendered
    pub pages: usize,
    /// Generated files and directories removed before rendering
    pub removed: usize,
}

pub struct Builder {
    config: WebsiteConfig,
}

impl Builder {
    pub fn new(config: WebsiteConfig) -> Self {
        Self { config }
    }

    /// Load the site, remove previous output and render every page.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        // Step 1: Discover pages and parse layouts
        let site = Website::load(&self.config)?;
        tracing::info!(
            pages = site.pages.len(),
            layouts = site.layouts.len(),
            "loaded site"
        );

        // Step 2: Clean previous output
        let removed = clean_output(&site.output_dir)?;
        tracing::debug!(removed, output = %site.output_dir.display(), "cleaned output");

        // Step 3: Render
        let pages = render_site(&site.pages, &site.layouts)?;
        tracing::info!(pages, output = %site.output_dir.display(), "built site");

        Ok(BuildResult {
            site,
            pages,
            removed,
        })
    }

    /// Render the loaded pages again.
    ///
    /// Layouts and partials are parsed afresh from the files recorded at
    /// load time, so template edits show up. The page list is the one
    /// discovered by the initial load.
    pub fn rebuild(&self, site: &Website) -> Result<usize, BuildError> {
        let layouts = LayoutRegistry::load(&site.layout_sources)?;
        clean_output(&site.output_dir)?;
        let pages = render_site(&site.pages, &layouts)?;
        tracing::info!(pages, "rebuilt site");
        Ok(pages)
    }

    /// Directories whose template files trigger a rebuild.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.config.pages_dir.clone()];
        if !self.config.layouts_dir.starts_with(&self.config.pages_dir) {
            dirs.push(self.config.layouts_dir.clone());
        }
        dirs
    }
}
