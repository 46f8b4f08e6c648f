//! Configuration type definitions.
//!
//! These mirror the optional `ditto.yaml` project file. Every field has a
//! default so a project without a config file follows the directory
//! conventions.

use std::path::PathBuf;

use serde::Deserialize;

// =============================================================================
// Project configuration (the `ditto.yaml` file)
// =============================================================================

/// Project configuration as written on disk.
///
/// ```yaml
/// pages: pages
/// layouts: pages/layouts
/// output: public
/// templates:
///   extension: .tmpl
///   default_layout: default.tmpl
///   partial_prefix: _
/// dev:
///   shutdown_timeout_ms: 5000
///   watch:
///     backend: poll
///     poll_interval_ms: 1000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding page templates (relative to the project root)
    #[serde(default = "default_pages")]
    pub pages: PathBuf,
    /// Directory holding layouts and partials; defaults to `<pages>/layouts`
    #[serde(default)]
    pub layouts: Option<PathBuf>,
    /// Directory rendered HTML is written to
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub templates: TemplateConfig,
    /// Development-specific settings (watch mode, server shutdown)
    #[serde(default)]
    pub dev: DevConfig,
}

fn default_pages() -> PathBuf {
    PathBuf::from("pages")
}

fn default_output() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            layouts: None,
            output: default_output(),
            templates: TemplateConfig::default(),
            dev: DevConfig::default(),
        }
    }
}

// =============================================================================
// Template conventions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateConfig {
    /// Extension of template source files, including the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Layout used when neither the page name nor its directory match one
    #[serde(default = "default_layout")]
    pub default_layout: String,
    /// Layout files starting with this prefix are partials
    #[serde(default = "default_partial_prefix")]
    pub partial_prefix: String,
}

fn default_extension() -> String {
    ".tmpl".to_string()
}

fn default_layout() -> String {
    "default.tmpl".to_string()
}

fn default_partial_prefix() -> String {
    "_".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            default_layout: default_layout(),
            partial_prefix: default_partial_prefix(),
        }
    }
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
    /// How long in-flight requests may drain after a shutdown signal
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

/// Which mechanism detects source changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackend {
    /// Stat every tracked file on a fixed interval.
    #[default]
    Poll,
    /// Native file system events through `notify`.
    Native,
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub backend: WatchBackend,
    /// Poll interval in milliseconds (poll backend only).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds (native backend only).
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            backend: WatchBackend::default(),
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
