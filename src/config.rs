use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "settings-tree";
const CONFIG_FILE: &str = "config.json";

pub const SCHEMA_ENV: &str = "STREE_SCHEMA";
pub const ROOT_ENV: &str = "STREE_ROOT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Schema file to use instead of the builtin case tree
    pub schema: Option<PathBuf>,
    /// Remote path of the root container, e.g. `/Case`
    pub root: Option<String>,
}

impl CliConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `STREE_SCHEMA` / `STREE_ROOT` as looked up by `lookup`.
    /// Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(schema) = lookup(SCHEMA_ENV).filter(|v| !v.is_empty()) {
            self.schema = Some(PathBuf::from(schema));
        }
        if let Some(root) = lookup(ROOT_ENV).filter(|v| !v.is_empty()) {
            self.root = Some(root);
        }
        self
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"root": "/Session"}"#).unwrap();
        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.root.as_deref(), Some("/Session"));
        assert_eq!(config.schema, None);
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = CliConfig {
            schema: Some(PathBuf::from("a.json")),
            root: Some("/Case".into()),
        }
        .with_overrides(|key| match key {
            SCHEMA_ENV => Some("b.json".into()),
            ROOT_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.schema, Some(PathBuf::from("b.json")));
        assert_eq!(config.root.as_deref(), Some("/Case"));
    }
}
