use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationConfig {
    /// Words per minute the terminal narrator paces itself at, before the
    /// rate setting is applied.
    pub wpm: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://novelhall.vercel.app".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: get_default_data_dir()
                .join("library")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self { wpm: 200 }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    pub async fn load() -> Result<Self> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save().await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["api", "base_url"] => {
                self.api.base_url = value.to_string();
            }
            ["storage", "path"] => {
                self.storage.path = value.to_string();
            }
            ["narration", "wpm"] => {
                self.narration.wpm = value
                    .parse::<u64>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["api", "base_url"] => self.api.base_url.clone(),
            ["storage", "path"] => self.storage.path.clone(),
            ["narration", "wpm"] => self.narration.wpm.to_string(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             Api:\n\
             └─ base_url: {}\n\
             Storage:\n\
             └─ path: {}\n\
             Narration:\n\
             └─ wpm: {}",
            self.api.base_url, self.storage.path, self.narration.wpm
        )
    }

    pub async fn reset() -> Result<Self> {
        let config = Self::default();
        config.save().await?;
        Ok(config)
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "vorleser", "vorleser") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // Fallback to current directory if we can't determine project dirs
        PathBuf::from(".vorleser").join("config")
    }
}

/// Get the default data directory
pub fn get_default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "vorleser", "vorleser") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        // Fallback to current directory if we can't determine project dirs
        PathBuf::from(".vorleser").join("data")
    }
}
