//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served as static assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Generative API ===
    /// Server-held Gemini credential. Absence is reported per request.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Model id used in the generateContent path.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Gemini API origin.
    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,

    // === Data Store ===
    /// Supabase project URL.
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase anon key.
    #[serde(default)]
    pub supabase_anon_key: Option<String>,

    /// Optional timeout applied to outbound requests.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,
}

/// Validated data store settings.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Project base URL.
    pub url: Url,
    /// Access key sent as `apikey` and bearer token.
    pub key: String,
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-preview-05-20".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Treat blank values the same as unset ones.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// The Gemini credential, if one is configured.
    pub fn gemini_api_key(&self) -> Option<&str> {
        non_blank(&self.gemini_api_key)
    }

    /// Outbound request timeout, if configured.
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the data store settings required by the data proxy.
    pub fn store_settings(&self) -> Result<StoreSettings, ConfigError> {
        let url = non_blank(&self.supabase_url).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key =
            non_blank(&self.supabase_anon_key).ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let url = Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            name: "SUPABASE_URL",
            source,
        })?;

        Ok(StoreSettings {
            url,
            key: key.to_string(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            rust_log: default_log_level(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_api_base: default_gemini_api_base(),
            supabase_url: None,
            supabase_anon_key: None,
            upstream_timeout_secs: None,
        }
    }
}
