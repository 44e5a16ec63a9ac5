//! Configuration management for quipchat

use std::path::PathBuf;
use std::time::Duration;

use crate::model::{DEFAULT_API_BASE, DEFAULT_MODEL, GenerationConfig};
use crate::{Error, Result};

/// Default port for the relay
pub const DEFAULT_PORT: u16 = 3000;

/// Default upstream request timeout in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Relay configuration
#[derive(Clone)]
pub struct Config {
    /// Model API credential
    pub api_key: String,

    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: String,

    /// Model API base URL
    pub api_base: String,

    /// Sampling parameters sent with every request
    pub generation: GenerationConfig,

    /// HTTP server configuration
    pub api_server: ApiServerConfig,

    /// Timeout for each upstream model call
    pub upstream_timeout: Duration,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web client)
    pub static_dir: Option<PathBuf>,

    /// Global request budget per minute, if rate limiting is enabled
    pub rate_limit_rpm: Option<u32>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("generation", &self.generation)
            .field("api_server", &self.api_server)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if no API key is set or a numeric variable does not parse
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if no API key is set or a numeric variable does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("GEMINI_API_KEY (or API_KEY) must be set".to_string())
            })?;

        let model = lookup("QUIPCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = lookup("QUIPCHAT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let port = match lookup("QUIPCHAT_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse_var("QUIPCHAT_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let rate_limit_rpm = lookup("QUIPCHAT_RATE_LIMIT_RPM")
            .map(|raw| parse_var("QUIPCHAT_RATE_LIMIT_RPM", &raw))
            .transpose()?;

        let timeout_secs = match lookup("QUIPCHAT_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => parse_var("QUIPCHAT_UPSTREAM_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            api_base,
            generation: GenerationConfig::default(),
            api_server: ApiServerConfig {
                port,
                static_dir: lookup("QUIPCHAT_STATIC_DIR").map(PathBuf::from),
                rate_limit_rpm,
            },
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} has an invalid value: {raw:?}")))
}
