use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that supplies the OpenWeather key.
pub const API_KEY_ENV: &str = "OPENWEATHER_KEY";
/// Environment variable that supplies the forwarding proxy URL.
pub const PROXY_URL_ENV: &str = "SKYCAST_PROXY_URL";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather service settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Display preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Language code used to pick a localized place name (e.g. "ru").
    /// Falls back to "name, state, country" when unset or unavailable.
    #[serde(default)]
    pub place_language: Option<String>,
}

/// Per-endpoint request timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_geocode_timeout")]
    pub geocode_ms: u64,
    #[serde(default = "default_current_timeout")]
    pub current_ms: u64,
    #[serde(default = "default_forecast_timeout")]
    pub forecast_ms: u64,
    #[serde(default = "default_air_timeout")]
    pub air_ms: u64,
}

fn default_geocode_timeout() -> u64 {
    5000
}

fn default_current_timeout() -> u64 {
    6000
}

fn default_forecast_timeout() -> u64 {
    8000
}

fn default_air_timeout() -> u64 {
    5000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            geocode_ms: default_geocode_timeout(),
            current_ms: default_current_timeout(),
            forecast_ms: default_forecast_timeout(),
            air_ms: default_air_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key. Not needed when `proxy_url` is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Forwarding proxy that injects the key server-side
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// OpenWeather host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum geocoding candidates per search (1-5)
    #[serde(default = "default_geocode_limit")]
    pub geocode_limit: u8,

    /// How long geocoding results stay cached
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_secs: u64,

    /// How long weather payloads stay cached
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_secs: u64,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_geocode_limit() -> u8 {
    5
}

fn default_geocode_ttl() -> u64 {
    24 * 60 * 60
}

fn default_weather_ttl() -> u64 {
    3 * 60
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            proxy_url: None,
            base_url: default_base_url(),
            geocode_limit: default_geocode_limit(),
            geocode_ttl_secs: default_geocode_ttl(),
            weather_ttl_secs: default_weather_ttl(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl WeatherConfig {
    /// Check if an API key is configured (not empty, not a placeholder)
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(str::trim)
            .is_some_and(|k| !k.is_empty() && !k.starts_with("YOUR_"))
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy_url
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Environment values win over the file. They are never written back.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.weather.api_key = Some(key);
        }
        if let Some(proxy) = lookup(PROXY_URL_ENV).filter(|p| !p.is_empty()) {
            tracing::debug!("Using proxy URL from {}", PROXY_URL_ENV);
            self.weather.proxy_url = Some(proxy);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let weather = &self.weather;

        self.validate_url(&weather.base_url, "weather.base_url", &mut result);

        if weather.has_proxy() {
            if let Some(proxy) = weather.proxy_url.as_deref() {
                self.validate_url(proxy.trim(), "weather.proxy_url", &mut result);
            }
            if weather.has_api_key() {
                result.add_warning(
                    "weather.api_key",
                    "Proxy is configured; the API key will not be sent",
                );
            }
        } else if !weather.has_api_key() {
            result.add_error(
                "weather.api_key",
                format!(
                    "No API key or proxy configured (set weather.api_key, weather.proxy_url or {})",
                    API_KEY_ENV
                ),
            );
        }

        if weather.geocode_limit == 0 {
            result.add_error("weather.geocode_limit", "Geocode limit must be at least 1");
        } else if weather.geocode_limit > 5 {
            result.add_warning(
                "weather.geocode_limit",
                "OpenWeather returns at most 5 geocoding candidates",
            );
        }

        if weather.geocode_ttl_secs == 0 {
            result.add_warning("weather.geocode_ttl_secs", "Geocode caching disabled (0 seconds)");
        }
        if weather.weather_ttl_secs == 0 {
            result.add_warning("weather.weather_ttl_secs", "Weather caching disabled (0 seconds)");
        } else if weather.weather_ttl_secs > 3600 {
            result.add_warning(
                "weather.weather_ttl_secs",
                "Weather cache lifetime is more than an hour; data may be stale",
            );
        }

        let timeouts = &weather.timeouts;
        for (field, value) in [
            ("weather.timeouts.geocode_ms", timeouts.geocode_ms),
            ("weather.timeouts.current_ms", timeouts.current_ms),
            ("weather.timeouts.forecast_ms", timeouts.forecast_ms),
            ("weather.timeouts.air_ms", timeouts.air_ms),
        ] {
            if value == 0 {
                result.add_error(field, "Timeout must be greater than 0");
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn keyed() -> Config {
        let mut config = Config::default();
        config.weather.api_key = Some("abc123".to_string());
        config
    }

    #[test]
    fn test_keyed_default_config_is_valid() {
        let result = keyed().validate();
        assert!(result.is_valid(), "Config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_credentials_is_error() {
        let result = Config::default().validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_key"));
    }

    #[test]
    fn test_placeholder_key_counts_as_missing() {
        let mut config = Config::default();
        config.weather.api_key = Some("YOUR_NEW_KEY_HERE".to_string());
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_proxy_without_key_is_valid() {
        let mut config = Config::default();
        config.weather.proxy_url = Some("https://example.com/proxy".to_string());
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_proxy_and_key_warns() {
        let mut config = keyed();
        config.weather.proxy_url = Some("https://example.com/proxy".to_string());
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
    }

    #[test]
    fn test_invalid_proxy_url() {
        let mut config = Config::default();
        config.weather.proxy_url = Some("/.netlify/functions/openweather-proxy".to_string());
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.proxy_url"));
    }

    #[test]
    fn test_invalid_base_url_scheme() {
        let mut config = keyed();
        config.weather.base_url = "ftp://api.openweathermap.org".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = keyed();
        config.weather.timeouts.forecast_ms = 0;
        let result = config.validate();
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "weather.timeouts.forecast_ms"));
    }

    #[test]
    fn test_zero_ttl_is_warning() {
        let mut config = keyed();
        config.weather.weather_ttl_secs = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.weather_ttl_secs"));
    }

    #[test]
    fn test_geocode_limit_bounds() {
        let mut config = keyed();
        config.weather.geocode_limit = 0;
        assert!(!config.validate().is_valid());

        config.weather.geocode_limit = 9;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.geocode_limit"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            API_KEY_ENV => Some("from-env".to_string()),
            PROXY_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.weather.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.weather.proxy_url, None);
    }

    #[test]
    fn test_load_from_creates_defaults_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.weather.weather_ttl_secs, 180);

        let mut edited = created;
        edited.weather.api_key = Some("abc123".to_string());
        edited.weather.timeouts.air_ms = 2500;
        edited.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.weather.api_key.as_deref(), Some("abc123"));
        assert_eq!(reloaded.weather.timeouts.air_ms, 2500);
        assert_eq!(reloaded.weather.timeouts.current_ms, 6000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/skycast\"\n\n[weather]\nproxy_url = \"https://example.com/proxy\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.weather.geocode_limit, 5);
        assert_eq!(config.weather.geocode_ttl_secs, 86400);
        assert!(config.weather.has_proxy());
        assert!(config.ui.place_language.is_none());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
