use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";
const MIN_TIMEOUT_SECS: u64 = 1;

/// Environment variables checked for the API key, in priority order.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub content_path: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Everything the outbound client needs, resolved once at startup and
/// injected into it. A missing key is not an error here.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new() -> Self {
        Self {
            model: Some(DEFAULT_MODEL.to_string()),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("portfolio").join("config.json"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Resolves settings against the process environment.
    pub fn assistant_settings(&self) -> AssistantSettings {
        self.assistant_settings_with(|key| std::env::var(key).ok())
    }

    /// Env vars win over the file, the file wins over defaults.
    pub fn assistant_settings_with<F>(&self, env: F) -> AssistantSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        // An empty variable, e.g. a blank `.env` line, does not shadow later sources
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| env(var).filter(|key| !key.trim().is_empty()))
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()));

        let model = env("GEMINI_MODEL")
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let endpoint = env("GEMINI_ENDPOINT")
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let request_timeout = Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(MIN_TIMEOUT_SECS),
        );

        AssistantSettings {
            api_key,
            model,
            endpoint,
            request_timeout,
        }
    }
}
