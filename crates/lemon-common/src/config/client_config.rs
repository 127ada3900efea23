//! Client configuration
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use lemon_core::Intents;
use std::env;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";
pub const DEFAULT_API_URL: &str = "https://discord.com/api/v9";

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub env: Environment,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub reconnect: ReconnectConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Environment named by `APP_ENV`, read before the rest of the configuration
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        env::var("APP_ENV")
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Credentials sent in identify/resume and the REST `Authorization` header
#[derive(Clone)]
pub struct AuthConfig {
    pub token: String,
    /// Bot tokens are sent with a `Bot ` prefix over REST
    pub bot: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn authorization(&self) -> String {
        if self.bot {
            format!("Bot {}", self.token)
        } else {
            self.token.clone()
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .field("bot", &self.bot)
            .finish()
    }
}

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base url; query parameters are appended when connecting
    pub url: String,
    pub intents: Intents,
    /// Member count above which a guild is delivered without offline members
    pub large_threshold: u16,
    /// Per-payload compression flag in identify. Independent of the zlib-stream transport.
    pub compress: bool,
}

/// Linear backoff between reconnect attempts
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl ReconnectConfig {
    /// `min(base * attempt, max)`; attempt 0 means no wait
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    #[must_use]
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt > max)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(default_base_delay_ms()),
            max_delay: Duration::from_millis(default_max_delay_ms()),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub api_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Messages retained across all channels; 0 disables message caching
    pub max_messages: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

// Default value functions
fn default_large_threshold() -> u16 {
    250
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_max_messages() -> usize {
    1000
}

impl ClientConfig {
    /// Configuration with defaults for everything but the token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            env: Environment::default(),
            auth: AuthConfig {
                token: token.into(),
                bot: true,
            },
            gateway: GatewayConfig {
                url: DEFAULT_GATEWAY_URL.to_string(),
                intents: Intents::default(),
                large_threshold: default_large_threshold(),
                compress: false,
            },
            reconnect: ReconnectConfig::default(),
            http: HttpConfig {
                api_url: DEFAULT_API_URL.to_string(),
            },
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `LEMON_TOKEN` is missing or a variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("LEMON_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("LEMON_TOKEN"))?;
        let mut config = Self::new(token.trim());

        config.env = lookup("APP_ENV")
            .and_then(|s| Environment::parse(&s))
            .unwrap_or_default();
        config.auth.bot = parse_var(&lookup, "LEMON_BOT", parse_bool)?.unwrap_or(true);

        if let Some(url) = lookup("LEMON_GATEWAY_URL") {
            config.gateway.url = url.trim_end_matches('/').to_string();
        }
        if let Some(intents) = parse_var(&lookup, "LEMON_INTENTS", parse_intents)? {
            config.gateway.intents = intents;
        }
        config.gateway.large_threshold =
            parse_var(&lookup, "LEMON_LARGE_THRESHOLD", |s| s.parse().ok())?
                .unwrap_or_else(default_large_threshold);
        config.gateway.compress =
            parse_var(&lookup, "LEMON_COMPRESS_PAYLOADS", parse_bool)?.unwrap_or(false);

        if let Some(url) = lookup("LEMON_API_URL") {
            config.http.api_url = url.trim_end_matches('/').to_string();
        }

        let base_ms = parse_var(&lookup, "LEMON_RECONNECT_BASE_DELAY_MS", |s| s.parse().ok())?
            .unwrap_or_else(default_base_delay_ms);
        let max_ms = parse_var(&lookup, "LEMON_RECONNECT_MAX_DELAY_MS", |s| s.parse().ok())?
            .unwrap_or_else(default_max_delay_ms);
        if max_ms < base_ms {
            return Err(ConfigError::InvalidValue(
                "LEMON_RECONNECT_MAX_DELAY_MS",
                format!("{max_ms} is below the base delay {base_ms}"),
            ));
        }
        config.reconnect = ReconnectConfig {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            max_attempts: parse_var(&lookup, "LEMON_MAX_RECONNECT_ATTEMPTS", |s| {
                s.parse::<u32>().ok()
            })?
            .filter(|&n| n > 0),
        };

        config.cache.max_messages = parse_var(&lookup, "LEMON_MAX_MESSAGES", |s| s.parse().ok())?
            .unwrap_or_else(default_max_messages);

        Ok(config)
    }
}

/// Unset variables yield `Ok(None)`; set but unparsable ones are an error
fn parse_var<F, T, P>(lookup: &F, key: &'static str, parse: P) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or(ConfigError::InvalidValue(key, raw)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Either a raw integer or a comma-separated list of flag names
fn parse_intents(s: &str) -> Option<Intents> {
    if let Ok(bits) = s.parse::<u64>() {
        return Some(Intents::from_bits_truncate(bits));
    }
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .try_fold(Intents::empty(), |acc, name| {
            Intents::parse_name(name).map(|flag| acc | flag)
        })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
