//! Server configuration.
//!
//! Loaded from a YAML file; every key is optional:
//!
//! ```yaml
//! modules_dir: modules
//! layout_dir: layout
//! bind: 127.0.0.1:8080
//! workers: 4
//! listing_enabled: true
//! fragment_header: HX-Request
//! ```
//!
//! Relative directories resolve against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "mosaic.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub modules_dir: PathBuf,
    pub layout_dir: PathBuf,
    pub bind: String,
    /// Request-handling threads.
    pub workers: usize,
    /// Whether `/modules` lists the active modules.
    pub listing_enabled: bool,
    /// Header whose presence asks for a fragment instead of a full page.
    pub fragment_header: String,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("modules"),
            layout_dir: PathBuf::from("layout"),
            bind: "127.0.0.1:8080".to_string(),
            workers: 4,
            listing_enabled: true,
            fragment_header: "HX-Request".to_string(),
        }
    }
}

impl MosaicConfig {
    /// Parses YAML, filling missing keys with defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Loads configuration.
    ///
    /// - `Some(path)`: the file must exist.
    /// - `None`: uses `./mosaic.yaml` if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !local.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                local
            }
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        tracing::debug!(?path, "loaded config");
        Ok(config.resolve_relative_to(base))
    }

    /// Makes relative directories relative to `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.modules_dir.is_relative() {
            self.modules_dir = base.join(&self.modules_dir);
        }
        if self.layout_dir.is_relative() {
            self.layout_dir = base.join(&self.layout_dir);
        }
        self
    }
}
