//! Process configuration
//!
//! Read once at startup and handed to the client, pipeline and host shells.
//! Nothing below the binaries looks at the environment directly.

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Anything other than "production" selects the development profile.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Production => "production",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone)]
pub struct Config {
    /// `None` when unset or empty; the client then runs in stub mode.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub agent_temperature: f32,
    pub agent_max_tokens: u32,
    pub request_timeout: Duration,
    pub environment: Environment,
    pub debug: bool,
    pub port: u16,
}

impl Config {
    /// Build from the process environment. Call `dotenv::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = get("ENVIRONMENT")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            agent_temperature: parse_or("AGENT_TEMPERATURE", get("AGENT_TEMPERATURE"), DEFAULT_TEMPERATURE)?,
            agent_max_tokens: parse_or("AGENT_MAX_TOKENS", get("AGENT_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?,
            request_timeout: Duration::from_secs(parse_or(
                "AGENT_REQUEST_TIMEOUT_SECS",
                get("AGENT_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            environment,
            debug: environment == Environment::Development,
            port,
        })
    }

    /// Default tracing filter: verbose when the profile enables debug.
    pub fn default_log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    pub fn has_credential(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Override the credential, e.g. from a command-line flag.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.openai_api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            agent_temperature: DEFAULT_TEMPERATURE,
            agent_max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            environment: Environment::Development,
            debug: true,
            port: DEFAULT_PORT,
        }
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("agent_temperature", &self.agent_temperature)
            .field("agent_max_tokens", &self.agent_max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("port", &self.port)
            .finish()
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| {
        AssistantError::Config(format!("{} has an invalid value: {:?}", key, raw))
    })
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
