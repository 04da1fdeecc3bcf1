//! Configuration loading for medex
//!
//! A collection-local `medex.toml` takes precedence over the global
//! config at `<config dir>/medex/config.toml`. All keys are optional;
//! CLI flags override file values at the call site.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::collection::CONFIG_FILE;
use crate::error::{MedexError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub gdrive: GDriveSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportSection {
    /// Restrict export to the audio extension allow-list
    #[serde(default)]
    pub audio_only: bool,
    /// Scan only this field for media references
    #[serde(default)]
    pub search_in_field: Option<String>,
    /// Notes between progress emissions
    #[serde(default)]
    pub progress_batch: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDriveSection {
    /// API key passed explicitly to the Drive backend
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| MedexError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| MedexError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolve the effective config for a collection
    pub fn discover(collection_root: &Path) -> Result<Self> {
        let local = collection_root.join(CONFIG_FILE);
        if local.exists() {
            debug!(path = %local.display(), "using collection config");
            return Self::load(&local);
        }
        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!(path = %global.display(), "using global config");
                return Self::load(&global);
            }
        }
        Ok(Config::default())
    }

    /// Global config path, `None` when the platform has no config dir
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("medex").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[export]\naudio_only = true\nsearch_in_field = \"Front\"\nprogress_batch = 500\n\n[gdrive]\napi_key = \"k\"\ntimeout_seconds = 10\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.export.audio_only);
        assert_eq!(config.export.search_in_field.as_deref(), Some("Front"));
        assert_eq!(config.export.progress_batch, Some(500));
        assert_eq!(config.gdrive.api_key.as_deref(), Some("k"));
        assert_eq!(config.gdrive.timeout_seconds, Some(10));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(!config.export.audio_only);
        assert!(config.gdrive.api_key.is_none());
    }

    #[test]
    fn malformed_toml_is_an_invalid_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[export\naudio_only = yes").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, MedexError::InvalidConfig { .. }));
    }

    #[test]
    fn discover_prefers_the_collection_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[export]\naudio_only = true\n").unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert!(config.export.audio_only);
    }
}
