// File: src/config.rs
// Purpose: Router configuration parsing from pathway.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::FileStore;

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Upper bound in bytes for one compiled expression. Sibling patterns
    /// are split into several expressions when a merge would exceed it.
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Compiled table cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,

    /// Directory holding one encoded table per route set fingerprint
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

// Default values
fn default_regex_size_limit() -> usize {
    10 * (1 << 20)
}

fn default_false() -> bool {
    false
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".pathway-cache")
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            regex_size_limit: default_regex_size_limit(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_cache_dir(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: RouterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./pathway.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("pathway.toml")
    }

    pub fn with_regex_size_limit(mut self, limit: usize) -> Self {
        self.regex_size_limit = limit;
        self
    }

    /// Opens the configured table store, if caching is enabled
    pub fn open_store(&self) -> Result<Option<FileStore>> {
        if !self.cache.enabled {
            return Ok(None);
        }

        FileStore::new(&self.cache.directory).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.regex_size_limit, 10 * 1024 * 1024);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.directory, PathBuf::from(".pathway-cache"));
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<RouterConfig>("").unwrap_or_default();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_custom_values() {
        let toml = r#"
            regex_size_limit = 4096

            [cache]
            enabled = true
            directory = "/tmp/routes"
        "#;
        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.regex_size_limit, 4096);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.directory, PathBuf::from("/tmp/routes"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = RouterConfig::load("/nonexistent/pathway.toml").unwrap();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathway.toml");
        fs::write(&path, "regex_size_limit = 2048\n").unwrap();

        let config = RouterConfig::load(&path).unwrap();
        assert_eq!(config.regex_size_limit, 2048);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathway.toml");
        fs::write(&path, "regex_size_limit = \"big\"\n").unwrap();

        assert!(RouterConfig::load(&path).is_err());
    }

    #[test]
    fn test_store_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RouterConfig::default();
        config.cache.directory = dir.path().join("tables");

        assert!(config.open_store().unwrap().is_none());

        config.cache.enabled = true;
        assert!(config.open_store().unwrap().is_some());
        assert!(dir.path().join("tables").is_dir());
    }
}
