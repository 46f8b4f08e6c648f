//! Configuration loading from files.

use std::path::Path;

use super::{CONFIG_FILE, ConfigError, ProjectConfig};

impl ProjectConfig {
    /// Load `ditto.yaml` from the project root.
    /// Returns the default config if the file doesn't exist.
    pub fn load_from_root(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_file(&path)
    }

    /// Load the config from a file path
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;

        // An empty file is a valid "all defaults" config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}
