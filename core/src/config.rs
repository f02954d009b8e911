use crate::errors::{ZoeyError, ZoeyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";

/// Which OpenAI-compatible endpoint the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// api.openai.com, bearer key required
    OpenAi,
    /// Hosted Llama node with an OpenAI-compatible surface, no key required
    Gaia,
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Gaia => "https://llama8b.gaia.domains/v1",
        }
    }

    pub fn requires_api_key(self) -> bool {
        matches!(self, Provider::OpenAi)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gaia => write!(f, "gaia"),
        }
    }
}

impl FromStr for Provider {
    type Err = ZoeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gaia" | "llama" => Ok(Provider::Gaia),
            other => Err(ZoeyError::ConfigError(format!(
                "Unknown provider '{}'. Supported: openai, gaia",
                other
            ))),
        }
    }
}

/// Configuration for the Zoey service
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ZoeyConfig {
    pub provider: Option<Provider>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Upstream request timeout; unset means the request may block indefinitely
    pub timeout_secs: Option<u64>,
    pub http_addr: Option<String>,
    pub product_search_url: Option<String>,
}

impl ZoeyConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> ZoeyResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ZoeyError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                ZoeyError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads `~/.config/zoey/config.toml`, or the defaults when it is absent
    pub fn load_from_default() -> ZoeyResult<Self> {
        let path = get_default_config_file("zoey")?;
        Self::load_from_file(&path)
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> ZoeyResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            ZoeyError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ZoeyError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            ZoeyError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            provider: other.provider.or(self.provider),
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            base_url: other.base_url.clone().or_else(|| self.base_url.clone()),
            model: other.model.clone().or_else(|| self.model.clone()),
            vision_model: other
                .vision_model
                .clone()
                .or_else(|| self.vision_model.clone()),
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            http_addr: other.http_addr.clone().or_else(|| self.http_addr.clone()),
            product_search_url: other
                .product_search_url
                .clone()
                .or_else(|| self.product_search_url.clone()),
        }
    }

    /// Builds a config from environment variables, using `lookup` to read them
    ///
    /// `ZOEY_API_KEY` wins over `OPENAI_API_KEY`; a present `OPENAI_API_KEY`
    /// alone does not switch the provider.
    pub fn from_env_with<F>(lookup: F) -> ZoeyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("ZOEY_PROVIDER") {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };

        let max_tokens = match non_empty("ZOEY_MAX_TOKENS") {
            Some(raw) => Some(raw.trim().parse().map_err(|e| {
                ZoeyError::ConfigError(format!("Invalid ZOEY_MAX_TOKENS '{}': {}", raw, e))
            })?),
            None => None,
        };

        let timeout_secs = match non_empty("ZOEY_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse().map_err(|e| {
                ZoeyError::ConfigError(format!("Invalid ZOEY_TIMEOUT_SECS '{}': {}", raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            provider,
            api_key: non_empty("ZOEY_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")),
            base_url: non_empty("ZOEY_BASE_URL"),
            model: non_empty("ZOEY_MODEL"),
            vision_model: non_empty("ZOEY_VISION_MODEL"),
            temperature: None,
            max_tokens,
            timeout_secs,
            http_addr: non_empty("ZOEY_HTTP_ADDR"),
            product_search_url: non_empty("ZOEY_PRODUCT_SEARCH_URL"),
        })
    }

    /// Builds a config from the process environment
    pub fn from_env() -> ZoeyResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn provider(&self) -> Provider {
        self.provider.unwrap_or(Provider::Gaia)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider().default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn http_addr(&self) -> &str {
        self.http_addr.as_deref().unwrap_or(DEFAULT_HTTP_ADDR)
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> ZoeyResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        ZoeyError::ConfigError("Could not determine home directory".to_string())
    })?;

    let config_dir = home_dir.join(".config").join(app_name);

    Ok(config_dir)
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> ZoeyResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
