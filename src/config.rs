//! Configuration management for `StarrySpot`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::StarrySpotError;
use crate::inference::PromptTemplate;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `StarrySpot` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarrySpotConfig {
    /// Weather lookup configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Light pollution lookup configuration
    #[serde(default)]
    pub light_pollution: LightPollutionConfig,
    /// Inference engine configuration
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which weather lookup backs the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherSource {
    /// Fixed readings, no network
    Stub,
    /// Open-Meteo forecast API
    OpenMeteo,
}

/// Which light pollution lookup backs the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightPollutionSource {
    /// Fixed readings, no network
    Stub,
    /// lightpollutionmap.info raster queries
    LightPollutionMap,
}

/// Weather lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_source")]
    pub provider: WeatherSource,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
}

/// Light pollution lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightPollutionConfig {
    #[serde(default = "default_light_pollution_source")]
    pub provider: LightPollutionSource,
    /// API key, required by the lightpollutionmap provider
    pub api_key: Option<String>,
    #[serde(default = "default_light_pollution_base_url")]
    pub base_url: String,
    /// Raster layer to query
    #[serde(default = "default_light_pollution_layer")]
    pub layer: String,
    /// Request timeout in seconds
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
}

/// Inference engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,
    /// Bearer token; optional for local engines
    pub api_key: Option<String>,
    #[serde(default = "default_inference_model")]
    pub model: String,
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    #[serde(default = "default_inference_timeout")]
    pub timeout_seconds: u32,
    /// Replaces the built-in instruction template
    pub prompt_template: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_weather_source() -> WeatherSource {
    WeatherSource::OpenMeteo
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_lookup_timeout() -> u32 {
    30
}

fn default_light_pollution_source() -> LightPollutionSource {
    LightPollutionSource::Stub
}

fn default_light_pollution_base_url() -> String {
    "https://www.lightpollutionmap.info".to_string()
}

fn default_light_pollution_layer() -> String {
    "wa_2015".to_string()
}

fn default_inference_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_inference_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_inference_timeout() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: default_weather_source(),
            base_url: default_weather_base_url(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for LightPollutionConfig {
    fn default() -> Self {
        Self {
            provider: default_light_pollution_source(),
            api_key: None,
            base_url: default_light_pollution_base_url(),
            layer: default_light_pollution_layer(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_base_url(),
            api_key: None,
            model: default_inference_model(),
            temperature: None,
            timeout_seconds: default_inference_timeout(),
            prompt_template: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl StarrySpotConfig {
    /// Load configuration from the given file, or the default location, plus environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit || config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(explicit)
                    .format(config::FileFormat::Toml),
            );
        }

        // STARRYSPOT_INFERENCE__API_KEY -> inference.api_key
        builder = builder.add_source(
            Environment::with_prefix("STARRYSPOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", config_file.display()))?;

        let mut config: StarrySpotConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("starryspot").join("config.toml"))
    }

    /// Apply default values to fields that were set but left empty
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_lookup_timeout();
        }
        if self.light_pollution.base_url.is_empty() {
            self.light_pollution.base_url = default_light_pollution_base_url();
        }
        if self.light_pollution.layer.is_empty() {
            self.light_pollution.layer = default_light_pollution_layer();
        }
        if self.light_pollution.timeout_seconds == 0 {
            self.light_pollution.timeout_seconds = default_lookup_timeout();
        }
        if self.inference.base_url.is_empty() {
            self.inference.base_url = default_inference_base_url();
        }
        if self.inference.model.is_empty() {
            self.inference.model = default_inference_model();
        }
        if self.inference.timeout_seconds == 0 {
            self.inference.timeout_seconds = default_inference_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_prompt_template()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.inference.api_key {
            check_api_key("Inference", api_key)?;
        }

        match (&self.light_pollution.provider, &self.light_pollution.api_key) {
            (LightPollutionSource::LightPollutionMap, None) => {
                return Err(StarrySpotError::config(
                    "The lightpollutionmap provider needs light_pollution.api_key. Either set it or use provider = \"stub\".",
                )
                .into());
            }
            (_, Some(api_key)) => check_api_key("Light pollution", api_key)?,
            (LightPollutionSource::Stub, None) => {}
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, seconds) in [
            ("Weather", self.weather.timeout_seconds),
            ("Light pollution", self.light_pollution.timeout_seconds),
            ("Inference", self.inference.timeout_seconds),
        ] {
            if seconds > 300 {
                return Err(StarrySpotError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if let Some(temperature) = self.inference.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(StarrySpotError::config(
                    "Inference temperature must be between 0.0 and 2.0",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(StarrySpotError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(StarrySpotError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Light pollution", &self.light_pollution.base_url),
            ("Inference", &self.inference.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(StarrySpotError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_prompt_template(&self) -> Result<()> {
        if let Some(template) = &self.inference.prompt_template {
            PromptTemplate::new(template.clone())
                .with_context(|| "Invalid inference.prompt_template")?;
        }
        Ok(())
    }
}

fn check_api_key(name: &str, api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(StarrySpotError::config(format!(
            "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
        ))
        .into());
    }

    if api_key.len() < 8 {
        return Err(StarrySpotError::config(format!(
            "{name} API key appears to be invalid (too short). Please check your API key."
        ))
        .into());
    }

    Ok(())
}
