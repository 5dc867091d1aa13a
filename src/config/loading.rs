//! Configuration loading functions.

use std::fs;
use std::path::Path;

use super::error::ConfigError;
use super::types::Config;

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.display().to_string(),
                source: e,
            }),
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            }),
            "toml" => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Err(ConfigError::UnsupportedFormat(
                path.display().to_string(),
                ext,
            )),
        }
    }

    /// Load configuration from the working directory or global config.
    ///
    /// Search order:
    /// 1. `.k8s-lse.yaml` / `.k8s-lse.yml` in the working directory
    /// 2. `.k8s-lse.json`
    /// 3. `.k8s-lse.toml`
    /// 4. `~/.config/k8s-lse/config.yaml`
    /// 5. Default configuration
    pub fn load(project_root: Option<&Path>) -> Self {
        if let Some(root) = project_root {
            for filename in &[
                ".k8s-lse.yaml",
                ".k8s-lse.yml",
                ".k8s-lse.json",
                ".k8s-lse.toml",
            ] {
                let path = root.join(filename);
                if path.exists() {
                    match Self::from_file(&path) {
                        Ok(config) => return config,
                        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring config file"),
                    }
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("k8s-lse").join("config.yaml");
            if global_config.exists()
                && let Ok(config) = Self::from_file(&global_config)
            {
                return config;
            }
        }

        Self::default()
    }
}
