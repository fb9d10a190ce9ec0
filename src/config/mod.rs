// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{RelayError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Compatibility variables (`OPENAI_API_KEY`, `FLASK_RUN_PORT`, ...)
    /// 3. Environment variables (prefix: `VISION_RELAY_`)
    /// 4. Config file
    /// 5. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::with_name(&Self::default_config_path()).required(false))
            // Override with environment variables, nested keys joined by `__`
            .add_source(
                Environment::with_prefix("VISION_RELAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        app_config.apply_compat_env(|key| std::env::var(key).ok())?;
        Ok(app_config)
    }

    /// Overlay the plain environment variables the relay has always honoured.
    ///
    /// `lookup` resolves a variable name to its value so callers (and tests)
    /// decide where values come from.
    pub fn apply_compat_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.upstream.api_key = Some(key);
        }

        if let Some(port) = lookup("FLASK_RUN_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                RelayError::Config(format!("FLASK_RUN_PORT is not a valid port: {}", port))
            })?;
        }

        let debug_flag = lookup("FLASK_DEBUG").is_some_and(|v| v == "1");
        let dev_env = lookup("FLASK_ENV").is_some_and(|v| v == "development");
        if debug_flag || dev_env {
            self.server.debug = true;
        }

        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vision-relay")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.upstream.model, "gpt-4o-mini");
        assert_eq!(config.upstream.max_tokens, 512);
        assert_eq!(config.upstream.timeout_seconds, 60);
        assert_eq!(config.image.max_width, 1024);
        assert_eq!(config.image.jpeg_quality, 75);
        assert!(config.image.resize);
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_compat_env_overlay() {
        let mut config = AppConfig::default();
        config
            .apply_compat_env(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("FLASK_RUN_PORT", "8081"),
                ("FLASK_DEBUG", "1"),
            ]))
            .unwrap();

        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.server.port, 8081);
        assert!(config.server.debug);
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_compat_env(lookup_from(&[("OPENAI_API_KEY", "  ")]))
            .unwrap();
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_development_env_enables_debug() {
        let mut config = AppConfig::default();
        config
            .apply_compat_env(lookup_from(&[("FLASK_ENV", "development")]))
            .unwrap();
        assert!(config.server.debug);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_compat_env(lookup_from(&[("FLASK_RUN_PORT", "http")]));
        assert!(matches!(result, Err(RelayError::Config(_))));
    }
}
