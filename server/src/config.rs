use std::net::SocketAddr;
use std::path::Path;

use tracing::info;
use zoey_core::{
    get_default_config_file, ZoeyConfig, ZoeyError, ZoeyResult, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_VISION_MODEL,
};

/// Resolved settings the request handlers work with
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub http_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            http_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl AppConfig {
    pub fn from_zoey(config: &ZoeyConfig) -> ZoeyResult<Self> {
        let http_addr = config.http_addr().parse().map_err(|e| {
            ZoeyError::ConfigError(format!(
                "Invalid HTTP address '{}': {}",
                config.http_addr(),
                e
            ))
        })?;

        Ok(Self {
            model: config.model().to_string(),
            vision_model: config.vision_model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            http_addr,
        })
    }
}

/// Layer configuration sources: file, then environment, then command line
///
/// Without an explicit path the default `~/.config/zoey/config.toml` is used
/// when it exists.
pub fn load_layered(
    path: Option<&Path>,
    env: &ZoeyConfig,
    cli: &ZoeyConfig,
) -> ZoeyResult<ZoeyConfig> {
    let file = match path {
        Some(path) => {
            let config = ZoeyConfig::load_from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => {
            let config = ZoeyConfig::load_from_default()?;
            if let Ok(path) = get_default_config_file("zoey") {
                info!("Loaded configuration from {}", path.display());
            }
            config
        }
    };

    Ok(file.merge(env).merge(cli))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use zoey_core::Provider;

    #[test]
    fn test_defaults_resolve() {
        let config = AppConfig::from_zoey(&ZoeyConfig::default()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_addr() {
        let config = ZoeyConfig {
            http_addr: Some("localhost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            AppConfig::from_zoey(&config),
            Err(ZoeyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_layering_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "provider = \"openai\"\nmodel = \"file-model\"\nmax_tokens = 100\nhttp_addr = \"0.0.0.0:8000\"\n",
        )
        .unwrap();

        let env = ZoeyConfig {
            model: Some("env-model".to_string()),
            max_tokens: Some(200),
            ..Default::default()
        };
        let cli = ZoeyConfig {
            model: Some("cli-model".to_string()),
            ..Default::default()
        };

        let config = load_layered(Some(&path), &env, &cli).unwrap();
        assert_eq!(config.provider, Some(Provider::OpenAi));
        assert_eq!(config.model.as_deref(), Some("cli-model"));
        assert_eq!(config.max_tokens, Some(200));
        assert_eq!(config.http_addr.as_deref(), Some("0.0.0.0:8000"));
    }
}
