// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("bakery");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the user's config, writing defaults on first run, then apply env overrides
pub fn load_config() -> Result<AppConfig> {
    let config = load_config_from(&get_config_path()?)?;
    Ok(apply_api_key_override(
        config,
        std::env::var(API_KEY_ENV).ok(),
    ))
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        let default_config = AppConfig::default();
        save_config_to(config_path, &default_config)?;
        tracing::info!(path = %config_path.display(), "wrote default config");
        return Ok(default_config);
    }

    let contents = fs::read_to_string(config_path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(config_path, contents).context("Failed to write config file")?;

    Ok(())
}

/// A non-empty key from the environment wins over the file
pub fn apply_api_key_override(mut config: AppConfig, env_key: Option<String>) -> AppConfig {
    if let Some(key) = env_key.filter(|key| !key.trim().is_empty()) {
        config.api_key = key;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BlockThreshold, SafetySetting};
    use tempfile::TempDir;

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = load_config_from(&config_path);

        assert!(
            config.is_ok(),
            "Config loading failed: {:?}",
            config.as_ref().err()
        );
        assert_eq!(config.unwrap(), AppConfig::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            api_key: "secret".to_string(),
            model_name: "gemini-1.5-pro".to_string(),
            image_dir: Some(PathBuf::from("/tmp/bakes")),
            safety_settings: SafetySetting::all(BlockThreshold::BlockOnlyHigh),
            ..Default::default()
        };
        save_config_to(&config_path, &config).unwrap();

        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "request_timeout = \"soon\"").unwrap();

        let error = load_config_from(&config_path).unwrap_err();
        assert!(error.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_key_overrides_file() {
        let config = AppConfig {
            api_key: "from-file".to_string(),
            ..Default::default()
        };
        let config = apply_api_key_override(config, Some("from-env".to_string()));
        assert_eq!(config.api_key, "from-env");
    }

    #[test]
    fn test_empty_env_key_is_ignored() {
        let config = AppConfig {
            api_key: "from-file".to_string(),
            ..Default::default()
        };
        let config = apply_api_key_override(config, Some(String::new()));
        assert_eq!(config.api_key, "from-file");

        let config = apply_api_key_override(config, None);
        assert_eq!(config.api_key, "from-file");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config);
        assert!(serialized.is_ok());

        let deserialized: Result<AppConfig, _> = toml::from_str(&serialized.unwrap());
        assert!(deserialized.is_ok());
    }
}
