//! Configuration file support for the training game.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/training-game/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Location of the player state document inside a data directory
    pub fn state_path(data_dir: &Path) -> PathBuf {
        data_dir.join("state.json")
    }
}

/// External catalog documents
///
/// Each path points at a JSON array of definitions. Unset tables use the
/// built-in catalog.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub activities: Option<PathBuf>,

    #[serde(default)]
    pub businesses: Option<PathBuf>,
}

/// Player profile and display preferences
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub username: String,

    #[serde(default = "default_show_progressive")]
    pub show_progressive: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            show_progressive: default_show_progressive(),
        }
    }
}

// Default value functions
fn home_dir_or_cwd() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join("training-game")
}

fn default_show_progressive() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join("training-game").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.data.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data.data_dir must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.data_dir.ends_with("training-game"));
        assert!(config.catalog.activities.is_none());
        assert!(config.catalog.businesses.is_none());
        assert!(config.profile.show_progressive);
        assert!(config.profile.username.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.profile.username = "sam".into();
        config.catalog.businesses = Some(PathBuf::from("/tmp/businesses.json"));

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.profile.username, "sam");
        assert_eq!(parsed.catalog.businesses, config.catalog.businesses);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[profile]
show_progressive = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.profile.show_progressive);
        assert!(config.profile.username.is_empty()); // default
        assert!(config.catalog.activities.is_none()); // default
    }

    #[test]
    fn test_load_from_and_save_to() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, temp_dir.path().join("data"));
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[data]\ndata_dir = \"\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
