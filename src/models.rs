use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::{BlockThreshold, GenerationConfig, SafetySetting};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    /// Directory scanned for images that can be attached to a prompt
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default = "default_safety_settings")]
    pub safety_settings: Vec<SafetySetting>,
}

fn default_model_name() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

const fn default_timeout() -> u64 {
    600
}

fn default_safety_settings() -> Vec<SafetySetting> {
    SafetySetting::all(BlockThreshold::BlockMediumAndAbove)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_name: default_model_name(),
            base_url: default_base_url(),
            request_timeout: default_timeout(),
            image_dir: None,
            generation: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
        }
    }
}

impl AppConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
