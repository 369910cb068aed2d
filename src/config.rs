//! Configuration Management
//!
//! Handles persistent configuration storage for awsinv.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Regions to inventory when `--region` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    /// Resource types to inventory when `--resources` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    /// Directory reports are written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Log file used when `--log-file` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awsinv").join("config.json"))
    }

    /// Read configuration from disk; no config directory or file yields the defaults
    pub fn read() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::read_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Read an explicit path; unreadable or malformed files are errors
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed config {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;

        Ok(())
    }

    /// Get effective regions (CLI > config > default)
    pub fn effective_regions(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return cli.to_vec();
        }
        match self.regions {
            Some(ref regions) if !regions.is_empty() => regions.clone(),
            _ => vec![crate::inventory::DEFAULT_REGION.to_string()],
        }
    }

    /// Get effective resource keys (CLI > config > all). Unknown configured
    /// keys are dropped with a warning; an empty result selects everything.
    pub fn effective_resources(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return cli.to_vec();
        }
        let Some(ref configured) = self.resources else {
            return Vec::new();
        };

        configured
            .iter()
            .filter(|key| {
                let known = crate::resource::get_resource(key).is_some();
                if !known {
                    tracing::warn!("Skipping unknown resource type in config: {}", key);
                }
                known
            })
            .cloned()
            .collect()
    }

    /// Get effective output directory (CLI > config > `data`)
    pub fn effective_output_dir(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(crate::report::DEFAULT_OUTPUT_DIR))
    }

    /// Get effective log file (CLI > config)
    pub fn effective_log_file(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf).or_else(|| self.log_file.clone())
    }

    /// Remember a region and resource selection and save
    pub fn set_defaults(&mut self, regions: &[String], resources: &[String]) -> Result<()> {
        self.regions = Some(regions.to_vec());
        self.resources = if resources.is_empty() {
            None
        } else {
            Some(resources.to_vec())
        };
        self.save()
    }
}
