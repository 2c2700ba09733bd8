//! Application configuration.
//!
//! Loaded from TOML, then overridden by environment variables:
//!
//! | key                              | env var                    |
//! |----------------------------------|----------------------------|
//! | `broker.webhook_url`             | `SIGNAL_STACK_WEBHOOK_URL` |
//! | `trading.max_shares`             | `MAX_SHARES`               |
//! | `trading.cooldown_period_hours`  | `COOLDOWN_PERIOD_HOURS`    |
//! | `trading.pause_seconds`          | `PAUSE_SECONDS`            |
//! | `trading.policy`                 | `SEARCH_POLICY`            |
//! | `instruments.long`               | `LONG_SYMBOL`              |
//! | `instruments.short`              | `SHORT_SYMBOL`             |
//! | `server.host`                    | `HOST`                     |
//! | `server.port`                    | `PORT`                     |
//! | `telemetry.log_level`            | `LOG_LEVEL`                |

use crate::error::{AppError, AppResult};
use flip_core::InstrumentPair;
use flip_executor::{DiscoveryConfig, SearchPolicy};
use flip_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Broker endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// SignalStack webhook URL. Treat as a secret.
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    /// Per-request timeout. None = no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_webhook_url() -> String {
    "https://app.signalstack.com/hook/changeme".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            webhook_url: default_webhook_url(),
            request_timeout_secs: None,
        }
    }
}

impl BrokerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Discovery and cooldown parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Upper bound on any probe size.
    #[serde(default = "default_max_shares")]
    pub max_shares: u32,
    /// Length of the post-trade quiescent window.
    #[serde(default = "default_cooldown_period_hours")]
    pub cooldown_period_hours: u64,
    /// Pause after each probe and before the unwind.
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: u64,
    #[serde(default)]
    pub policy: SearchPolicy,
}

fn default_max_shares() -> u32 {
    5000
}

fn default_cooldown_period_hours() -> u64 {
    12
}

fn default_pause_seconds() -> u64 {
    1
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            max_shares: default_max_shares(),
            cooldown_period_hours: default_cooldown_period_hours(),
            pause_seconds: default_pause_seconds(),
            policy: SearchPolicy::default(),
        }
    }
}

impl TradingConfig {
    pub fn cooldown_period(&self) -> Duration {
        Duration::from_secs(self.cooldown_period_hours.saturating_mul(3600))
    }

    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            policy: self.policy,
            max_shares: self.max_shares,
            pause: Duration::from_secs(self.pause_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub instruments: InstrumentPair,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load the file at `path` (or the default path), apply environment
    /// overrides and validate.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SIGNAL_STACK_WEBHOOK_URL") {
            self.broker.webhook_url = url;
        }
        if let Some(v) = parse_var(&get, "MAX_SHARES")? {
            self.trading.max_shares = v;
        }
        if let Some(v) = parse_var(&get, "COOLDOWN_PERIOD_HOURS")? {
            self.trading.cooldown_period_hours = v;
        }
        if let Some(v) = parse_var(&get, "PAUSE_SECONDS")? {
            self.trading.pause_seconds = v;
        }
        if let Some(policy) = get("SEARCH_POLICY") {
            self.trading.policy = policy.parse()?;
        }
        if let Some(symbol) = get("LONG_SYMBOL") {
            self.instruments.long = symbol;
        }
        if let Some(symbol) = get("SHORT_SYMBOL") {
            self.instruments.short = symbol;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(v) = parse_var(&get, "PORT")? {
            self.server.port = v;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.telemetry.log_level = level.to_ascii_lowercase();
        }
        Ok(())
    }

    /// Reject configurations that cannot trade.
    pub fn validate(&self) -> AppResult<()> {
        if self.broker.webhook_url.trim().is_empty() {
            return Err(AppError::Config(
                "broker.webhook_url must not be empty".to_string(),
            ));
        }
        self.instruments.validate()?;
        Ok(())
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid {key}={raw}: {e}")))
        })
        .transpose()
}
