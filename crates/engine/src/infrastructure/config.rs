//! Engine configuration read from the environment.

use std::time::Duration;

use crate::infrastructure::narrator::DEFAULT_AI_SERVICE_URL;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE: &str = "rollcall.db";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DICE_REQUEST_TTL_SECS: u64 = 1800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    /// `sqlite:` URL or file path
    pub database: String,
    pub ai_service_url: String,
    pub ai_request_timeout: Duration,
    /// Image generation is disabled when unset
    pub image_service_url: Option<String>,
    pub image_service_api_key: Option<String>,
    pub dice_request_ttl: Duration,
    /// Raw `CORS_ALLOWED_ORIGINS`; no CORS layer when unset
    pub cors_allowed_origins: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            ai_service_url: DEFAULT_AI_SERVICE_URL.to_string(),
            ai_request_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            image_service_url: None,
            image_service_api_key: None,
            dice_request_ttl: Duration::from_secs(DEFAULT_DICE_REQUEST_TTL_SECS),
            cors_allowed_origins: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; malformed
    /// numbers are logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let server_port = get("SERVER_PORT")
            .map(|v| ("SERVER_PORT", v))
            .or_else(|| get("PORT").map(|v| ("PORT", v)))
            .map(|(key, v)| parse_or(key, &v, defaults.server_port))
            .unwrap_or(defaults.server_port);

        let ai_timeout_secs = get("AI_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_or("AI_REQUEST_TIMEOUT_SECS", &v, DEFAULT_AI_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_AI_TIMEOUT_SECS);

        let dice_ttl_secs = get("DICE_REQUEST_TTL_SECS")
            .map(|v| parse_or("DICE_REQUEST_TTL_SECS", &v, DEFAULT_DICE_REQUEST_TTL_SECS))
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_DICE_REQUEST_TTL_SECS);

        Self {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            database: get("DATABASE_URL")
                .or_else(|| get("SQLITE_PATH"))
                .unwrap_or(defaults.database),
            ai_service_url: get("AI_SERVICE_URL").unwrap_or(defaults.ai_service_url),
            ai_request_timeout: Duration::from_secs(ai_timeout_secs),
            image_service_url: get("IMAGE_SERVICE_URL"),
            image_service_api_key: get("IMAGE_SERVICE_API_KEY"),
            dice_request_ttl: Duration::from_secs(dice_ttl_secs),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key, value = raw, default = %default, "Malformed config value, using default");
            default
        }
    }
}
