use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::model::Language;

/// Scanner configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Gemini model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for authentication (can also be set via API_KEY or GEMINI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for the generative language API (for proxies and tests)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds; unset waits for the model indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Check recipe count and required text after parsing the model output
    #[serde(default = "default_strict_validation")]
    pub strict_validation: bool,
    /// Language used when the caller does not pick one
    #[serde(default)]
    pub language: Language,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: None,
            strict_validation: default_strict_validation(),
            language: Language::default(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_strict_validation() -> bool {
    true
}

impl ScannerConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with POWERPLATE__ prefix
    /// 2. powerplate.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: POWERPLATE__API_KEY, POWERPLATE__TIMEOUT_SECS
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("powerplate").required(false))
            .add_source(
                Environment::with_prefix("POWERPLATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Returns the configured key, or the first of API_KEY / GEMINI_API_KEY.
    ///
    /// A missing key yields an empty string; the request then fails at the
    /// transport layer.
    pub fn resolve_api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var("API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ScannerConfig::default();
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.temperature, 0.4);
        assert_eq!(config.max_tokens, 8192);
        assert!(config.timeout().is_none());
        assert!(config.strict_validation);
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_configured_key_wins() {
        let config = ScannerConfig {
            api_key: Some("configured".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(), "configured");
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                "model = \"gemini-test\"\ntimeout_secs = 20\nlanguage = \"nd\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ScannerConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.model, "gemini-test");
        assert_eq!(config.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.language, Language::Nd);
        assert_eq!(config.max_tokens, 8192);
    }
}
