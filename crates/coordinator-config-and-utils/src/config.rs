//! Configuration management for the coordinator.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default Worklens API base URL (can be overridden at compile time via WORKLENS_API_URL).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("WORKLENS_API_URL") {
    Some(url) => url,
    None => "https://api.worklens.app",
};

/// Default companion web application URL (can be overridden at compile time via WORKLENS_WEB_APP_URL).
pub const DEFAULT_WEB_APP_URL: &str = match option_env!("WORKLENS_WEB_APP_URL") {
    Some(url) => url,
    None => "https://worklens.app",
};

/// Default trusted web origin for external handoff messages
/// (can be overridden at compile time via WORKLENS_TRUSTED_ORIGIN).
pub const DEFAULT_TRUSTED_WEB_ORIGIN: &str = match option_env!("WORKLENS_TRUSTED_ORIGIN") {
    Some(origin) => origin,
    None => "http://localhost:3000",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Worklens API base URL (exchange/validate/logout endpoints).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Companion web application URL (login and options pages).
    #[serde(default = "default_web_app_url")]
    pub web_app_url: String,
    /// The one web origin allowed to hand off auth tokens.
    #[serde(default = "default_trusted_web_origin")]
    pub trusted_web_origin: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_web_app_url() -> String {
    DEFAULT_WEB_APP_URL.to_string()
}

fn default_trusted_web_origin() -> String {
    DEFAULT_TRUSTED_WEB_ORIGIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_app_url: DEFAULT_WEB_APP_URL.to_string(),
            trusted_web_origin: DEFAULT_TRUSTED_WEB_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    /// Note: the endpoint URLs and the trusted origin are compile-time only
    /// and always use the built-in defaults, regardless of the config file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from config file)
        config.api_base_url = DEFAULT_API_BASE_URL.to_string();
        config.web_app_url = DEFAULT_WEB_APP_URL.to_string();
        config.trusted_web_origin = DEFAULT_TRUSTED_WEB_ORIGIN.to_string();

        // Environment variables can only override log_level
        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    /// Only log_level can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("WORKLENS_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.web_app_url, DEFAULT_WEB_APP_URL);
        assert_eq!(config.trusted_web_origin, DEFAULT_TRUSTED_WEB_ORIGIN);
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug"
        }"#;

        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        // Note: endpoint URLs and the trusted origin are compile-time only
        // and will be forced to defaults on load
        let mut config = Config::default();
        config.log_level = "trace".to_string();

        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.log_level, "trace");
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.trusted_web_origin, DEFAULT_TRUSTED_WEB_ORIGIN);
    }

    #[test]
    fn test_config_api_base_url_parse() {
        let config = Config::default();
        let url = config.api_base_url().unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_config_invalid_url() {
        let mut config = Config::default();
        config.api_base_url = "not a valid url".to_string();

        let result = config.api_base_url();
        assert!(result.is_err());
    }

    #[test]
    fn test_default_constants() {
        assert!(!DEFAULT_LOG_LEVEL.is_empty());
        assert!(!DEFAULT_API_BASE_URL.is_empty());
        assert!(!DEFAULT_WEB_APP_URL.is_empty());
        assert!(DEFAULT_TRUSTED_WEB_ORIGIN.starts_with("http"));
    }
}
