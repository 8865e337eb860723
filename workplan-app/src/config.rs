use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use workplan_core::DEFAULT_IMAGE_LIMIT_BYTES;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "workplan.yaml";

/// Settings for a run of the work plan tool, read from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fallback filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub image_limit_bytes: usize,
    /// Directory that receives a timestamped plan table after each run.
    pub export_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            image_limit_bytes: DEFAULT_IMAGE_LIMIT_BYTES,
            export_dir: None,
        }
    }
}

impl AppConfig {
    /// An explicit path must exist; the implicit default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
