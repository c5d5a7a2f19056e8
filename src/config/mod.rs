use std::env;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 24 * 3600;

// Every bearer setting is read from this prefix.
const BEARER_PREFIX: &str = "AUTH_BEARER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value `{0}`")]
    Missing(&'static str),
    #[error("invalid configuration value `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub bearer: BearerConfig,
}

#[derive(Debug, Clone)]
pub struct BearerConfig {
    pub issuer: Option<String>,
    /// Base64 encoded HMAC key.
    pub signing_key: Option<String>,
    pub audiences: Vec<String>,
    pub token_lifetime_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let server_port = match var("SERVER_PORT") {
            Some(port) => port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "SERVER_PORT".into(),
                    reason: e.to_string(),
                }
            })?,
            None => 3000,
        };

        Ok(Config {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://todos.db?mode=rwc".into()),
            server_host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            server_port,
            api_base_uri: var("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            bearer: BearerConfig::from_env()?,
        })
    }

    /// `api_base_uri` as a route prefix: one leading slash, no trailing
    /// slash, empty when the API is served from the root.
    pub fn api_prefix(&self) -> String {
        let trimmed = self.api_base_uri.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Hermetic configuration for tests: nothing is read from the environment
    /// and no signing key is set.
    pub fn for_testing() -> Self {
        Config {
            database_url: "sqlite::memory:".into(),
            server_host: "127.0.0.1".into(),
            server_port: 0,
            api_base_uri: "/api".into(),
            bearer: BearerConfig {
                issuer: Some("todo-api".into()),
                signing_key: None,
                audiences: vec!["todo-api".into()],
                token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            },
        }
    }
}

impl BearerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let lifetime_key = format!("{BEARER_PREFIX}TOKEN_LIFETIME");
        let token_lifetime_secs = match var(&lifetime_key) {
            Some(raw) => parse_lifetime(&raw).ok_or_else(|| ConfigError::Invalid {
                key: lifetime_key.clone(),
                reason: format!("`{raw}` is not a number of seconds or hours"),
            })?,
            None => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        Ok(BearerConfig {
            issuer: var(&format!("{BEARER_PREFIX}ISSUER")),
            signing_key: var(&format!("{BEARER_PREFIX}SIGNING_KEY")),
            audiences: var(&format!("{BEARER_PREFIX}AUDIENCES"))
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            token_lifetime_secs,
        })
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }

    pub fn require_issuer(&self) -> Result<&str, ConfigError> {
        self.issuer
            .as_deref()
            .filter(|issuer| !issuer.is_empty())
            .ok_or(ConfigError::Missing("AUTH_BEARER_ISSUER"))
    }

    pub fn signing_key_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        let encoded = self
            .signing_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("AUTH_BEARER_SIGNING_KEY"))?;

        STANDARD.decode(encoded).map_err(|e| ConfigError::Invalid {
            key: "AUTH_BEARER_SIGNING_KEY".into(),
            reason: e.to_string(),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

// "3600" is seconds, "12h" is hours.
fn parse_lifetime(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_suffix('h') {
        Some(hours) => hours.parse::<u64>().ok()?.checked_mul(3600),
        None => raw.parse().ok(),
    }
}
