//! Configuration management for the AgroBot assistant
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGROBOT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Bot persona
    pub bot: BotConfig,

    /// WhatsApp Cloud API configuration
    pub whatsapp: WhatsAppConfig,

    /// LLM completion configuration
    pub openai: OpenAiConfig,

    /// USDA PSD API configuration
    pub usda: UsdaConfig,

    /// OpenWeather API configuration
    pub openweather: OpenWeatherConfig,

    /// Pre-rendered map images
    pub images: ImagesConfig,

    /// Outbound HTTP settings
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Name the bot introduces itself with
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WhatsAppConfig {
    /// Graph API base URL, including version
    pub api_base_url: String,

    /// Sending phone number ID
    pub phone_number_id: String,

    /// Permanent or temporary access token
    pub access_token: String,

    /// Token expected in the webhook verification handshake
    pub verify_token: String,

    /// App secret for X-Hub-Signature-256 verification
    pub app_secret: Option<String>,
}

impl WhatsAppConfig {
    /// Both the phone number ID and a token are needed to talk to WhatsApp
    pub fn is_configured(&self) -> bool {
        !self.phone_number_id.trim().is_empty() && !self.sanitized_token().is_empty()
    }

    /// Access token with any whitespace or line breaks removed
    pub fn sanitized_token(&self) -> String {
        self.access_token.split_whitespace().collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    /// API key; completions are unavailable without one
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Chat model name
    pub model: String,

    /// Max tokens for assistant replies
    pub max_tokens: u32,

    /// Sampling temperature for assistant replies
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UsdaConfig {
    /// PSD API key (sent as X-Api-Key)
    pub api_key: String,

    /// PSD API base URL
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenWeatherConfig {
    /// OpenWeather API key
    pub api_key: String,

    /// Data API base URL
    pub base_url: String,

    /// Geocoding API base URL
    pub geocoding_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    /// Directory holding one sub-folder per map layer
    pub root_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout for upstream calls
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGROBOT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("bot.name", "Assistente")?
            .set_default("whatsapp.api_base_url", "https://graph.facebook.com/v22.0")?
            .set_default("whatsapp.phone_number_id", "")?
            .set_default("whatsapp.access_token", "")?
            .set_default("whatsapp.verify_token", "meu_token_secreto_123")?
            .set_default("openai.base_url", "https://api.openai.com/v1")?
            .set_default("openai.model", "gpt-3.5-turbo")?
            .set_default("openai.max_tokens", 500)?
            .set_default("openai.temperature", 0.7)?
            .set_default("usda.api_key", "")?
            .set_default("usda.base_url", "https://api.fas.usda.gov")?
            .set_default("openweather.api_key", "")?
            .set_default("openweather.base_url", "https://api.openweathermap.org/data/2.5")?
            .set_default("openweather.geocoding_url", "https://api.openweathermap.org/geo/1.0")?
            .set_default("images.root_dir", "static/clima")?
            .set_default("http.timeout_secs", 8)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGROBOT_ prefix)
            .add_source(
                Environment::with_prefix("AGROBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Warn about missing credentials without refusing to start; the REST
    /// endpoints stay usable without WhatsApp.
    pub fn warn_missing(&self) {
        if self.openai.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            tracing::warn!("OpenAI API key not set; AI replies and text normalization are disabled");
        }
        if !self.whatsapp.is_configured() {
            tracing::warn!("WhatsApp phone number ID or access token not set; webhook disabled");
        }
        if self.usda.api_key.is_empty() {
            tracing::warn!("USDA PSD API key not set");
        }
        if self.openweather.api_key.is_empty() {
            tracing::warn!("OpenWeather API key not set");
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
