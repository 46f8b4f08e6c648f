//! Configuration loading and types for ditto.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for the optional `ditto.yaml` file (`types`)
//! - Loading that file from the project root (`load`)
//! - Resolving it against the root into a validated [`WebsiteConfig`]

mod load;
mod types;

use std::path::{Path, PathBuf};

pub use types::{DevConfig, ProjectConfig, TemplateConfig, WatchBackend, WatchConfig};

/// Name of the optional project config file, looked up in the project root.
pub const CONFIG_FILE: &str = "ditto.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{kind} directory does not exist: {path}")]
    MissingDirectory { kind: &'static str, path: PathBuf },

    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, serde_yaml::Error),
}

// =============================================================================
// Resolved website configuration
// =============================================================================

/// Fully resolved configuration for one website.
///
/// All directories are absolute or root-relative and known to exist at the
/// time of construction.
#[derive(Debug, Clone)]
pub struct WebsiteConfig {
    pub pages_dir: PathBuf,
    pub layouts_dir: PathBuf,
    pub output_dir: PathBuf,
    pub templates: TemplateConfig,
    pub dev: DevConfig,
}

impl WebsiteConfig {
    /// Build the config for the project at `root`, applying `ditto.yaml`
    /// overrides if present.
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let project = ProjectConfig::load_from_root(root)?;
        Self::resolve(root, project)
    }

    /// Resolve a project config against its root and check that every
    /// directory exists.
    pub fn resolve(root: &Path, project: ProjectConfig) -> Result<Self, ConfigError> {
        let output_dir = resolve_dir(root, &project.output);
        let pages_dir = resolve_dir(root, &project.pages);
        let layouts_dir = match &project.layouts {
            Some(layouts) => resolve_dir(root, layouts),
            None => pages_dir.join("layouts"),
        };

        require_dir("output", &output_dir)?;
        require_dir("pages", &pages_dir)?;
        require_dir("layouts", &layouts_dir)?;

        Ok(Self {
            pages_dir,
            layouts_dir,
            output_dir,
            templates: project.templates,
            dev: project.dev,
        })
    }
}

fn resolve_dir(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_relative() {
        root.join(dir)
    } else {
        dir.to_path_buf()
    }
}

fn require_dir(kind: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingDirectory {
            kind,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scaffold(root: &Path) {
        std::fs::create_dir_all(root.join("pages/layouts")).unwrap();
        std::fs::create_dir_all(root.join("public")).unwrap();
    }

    #[test]
    fn test_from_root_conventions() {
        let tmp = TempDir::new().unwrap();
        scaffold(tmp.path());

        let config = WebsiteConfig::from_root(tmp.path()).unwrap();
        assert_eq!(config.pages_dir, tmp.path().join("pages"));
        assert_eq!(config.layouts_dir, tmp.path().join("pages/layouts"));
        assert_eq!(config.output_dir, tmp.path().join("public"));
        assert_eq!(config.templates, TemplateConfig::default());
        assert_eq!(config.dev.shutdown_timeout_ms, 5000);
        assert_eq!(config.dev.watch.backend, WatchBackend::Poll);
        assert_eq!(config.dev.watch.poll_interval_ms, 1000);
    }

    #[test]
    fn test_missing_output_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("pages/layouts")).unwrap();

        let err = WebsiteConfig::from_root(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingDirectory { kind: "output", .. }
        ));
    }

    #[test]
    fn test_missing_layouts_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("pages")).unwrap();
        std::fs::create_dir_all(tmp.path().join("public")).unwrap();

        let err = WebsiteConfig::from_root(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingDirectory { kind: "layouts", .. }
        ));
        assert!(err.to_string().contains("layouts directory does not exist"));
    }

    #[test]
    fn test_config_file_overrides() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src/templates")).unwrap();
        std::fs::create_dir_all(tmp.path().join("layouts")).unwrap();
        std::fs::create_dir_all(tmp.path().join("dist")).unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
pages: src/templates
layouts: layouts
output: dist
templates:
  extension: .tera
  default_layout: base.tera
dev:
  watch:
    backend: native
    debounce_ms: 50
"#,
        )
        .unwrap();

        let config = WebsiteConfig::from_root(tmp.path()).unwrap();
        assert_eq!(config.pages_dir, tmp.path().join("src/templates"));
        assert_eq!(config.layouts_dir, tmp.path().join("layouts"));
        assert_eq!(config.output_dir, tmp.path().join("dist"));
        assert_eq!(config.templates.extension, ".tera");
        assert_eq!(config.templates.default_layout, "base.tera");
        // Unset fields keep their defaults
        assert_eq!(config.templates.partial_prefix, "_");
        assert_eq!(config.dev.watch.backend, WatchBackend::Native);
        assert_eq!(config.dev.watch.debounce_ms, 50);
        assert_eq!(config.dev.watch.poll_interval_ms, 1000);
    }

    #[test]
    fn test_empty_config_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        scaffold(tmp.path());
        std::fs::write(tmp.path().join(CONFIG_FILE), "\n").unwrap();

        let config = WebsiteConfig::from_root(tmp.path()).unwrap();
        assert_eq!(config.output_dir, tmp.path().join("public"));
    }

    #[test]
    fn test_malformed_config_file() {
        let tmp = TempDir::new().unwrap();
        scaffold(tmp.path());
        std::fs::write(tmp.path().join(CONFIG_FILE), "pages: [unclosed").unwrap();

        let err = WebsiteConfig::from_root(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }
}
