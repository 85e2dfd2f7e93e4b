//! Configuration file discovery and loading

use super::engine_config::EngineConfiguration;
use crate::error::YangError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// File names searched for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".yangtreerc.json",
    ".yangtreerc.toml",
    "yangtree.yaml",
    "yangtree.yml",
    "yangtree.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by walking up from `start_path`
    ///
    /// In each directory the names of [`CONFIG_FILE_NAMES`] are tried in
    /// order; the search stops at the first hit or at the filesystem root.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| YangError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<EngineConfiguration> {
        EngineConfiguration::load(path).map_err(|e| {
            YangError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from `custom_path`, or auto-discover one
    ///
    /// Without an explicit path and without a discovered file the default
    /// configuration is returned.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<EngineConfiguration> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(YangError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(EngineConfiguration::default())
            }
        }
    }
}
