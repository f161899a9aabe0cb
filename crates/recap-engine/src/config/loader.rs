use super::schema::RecapConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

const PROJECT_FILE: &str = "recap.yaml";

/// Where `load_default` looks, most specific first: the working directory,
/// then the user's `~/.recap/config.yaml`.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".").join(PROJECT_FILE)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".recap").join("config.yaml"));
    }
    paths
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// First existing file from [`search_paths`], or built-in defaults when
    /// none exists.
    pub async fn load_default() -> Result<RecapConfig, ConfigError> {
        match search_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from(&path).await,
            None => Ok(RecapConfig::default()),
        }
    }

    /// An empty or whitespace-only file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<RecapConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(RecapConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}
