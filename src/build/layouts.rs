//! Layout registry.
//!
//! Each layout is parsed into its own `Tera` instance together with every
//! partial, so a page rendered through layout `blog.tmpl` can `include` or
//! `import` any partial without seeing other layouts. Registries are never
//! modified after loading; the renderer clones the layout it needs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use super::site::LoadError;

/// The files a layout registry is parsed from.
#[derive(Debug, Clone, Default)]
pub struct LayoutSources {
    /// Selectable layouts, e.g. `layouts/default.tmpl`
    pub layouts: Vec<PathBuf>,
    /// Partials, e.g. `layouts/_header.tmpl`
    pub partials: Vec<PathBuf>,
}

impl LayoutSources {
    /// Split layout-directory files into layouts and partials by file name
    /// prefix.
    pub fn partition(files: Vec<PathBuf>, partial_prefix: &str) -> Self {
        let (partials, layouts): (Vec<PathBuf>, Vec<PathBuf>) =
            files.into_iter().partition(|path| {
                path.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(partial_prefix))
            });
        Self { layouts, partials }
    }
}

/// Parsed layouts keyed by file name.
#[derive(Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, Tera>,
}

impl LayoutRegistry {
    /// Parse every layout together with all partials.
    pub fn load(sources: &LayoutSources) -> Result<Self, LoadError> {
        let mut base = Tera::default();
        let partials = sources
            .partials
            .iter()
            .map(|path| (path.as_path(), Some(template_name(path))));
        base.add_template_files(partials)
            .map_err(|source| LoadError::Partials {
                dir: common_dir(&sources.partials),
                source,
            })?;

        let mut layouts = BTreeMap::new();
        for path in &sources.layouts {
            let name = template_name(path);
            let mut tera = base.clone();
            tera.add_template_file(path, Some(name.as_str()))
                .map_err(|source| LoadError::Layout {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(layout = %name, path = %path.display(), "parsed layout");
            layouts.insert(name, tera);
        }

        Ok(Self { layouts })
    }

    /// Build a registry from in-memory sources: `(name, content)` pairs for
    /// layouts and partials.
    #[cfg(test)]
    pub(crate) fn from_raw(
        layouts: &[(&str, &str)],
        partials: &[(&str, &str)],
    ) -> Result<Self, tera::Error> {
        let mut base = Tera::default();
        base.add_raw_templates(partials.to_vec())?;

        let mut registry = BTreeMap::new();
        for (name, content) in layouts {
            let mut tera = base.clone();
            tera.add_raw_template(name, content)?;
            registry.insert((*name).to_string(), tera);
        }
        Ok(Self { layouts: registry })
    }

    pub fn get(&self, name: &str) -> Option<&Tera> {
        self.layouts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl std::fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Templates are registered under their file name.
fn template_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn common_dir(paths: &[PathBuf]) -> PathBuf {
    paths
        .first()
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
