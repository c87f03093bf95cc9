//! Client configuration loaded from environment variables.

use std::time::Duration;

/// Default backend address for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default period between completion polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Default upper bound on completion polls per job.
pub const DEFAULT_MAX_POLLS: u32 = 20;

/// Connection settings for one Lucid Loom backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base URL, no trailing slash.
    pub api_url: String,
    /// WebSocket base URL, no trailing slash.
    pub ws_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_api_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Settings for `api_url` with every other value at its default.
    pub fn for_api_url(api_url: &str) -> Self {
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        Self {
            ws_url: derive_ws_url(&api_url),
            api_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                        |
    /// |-----------------------------|--------------------------------|
    /// | `LOOM_API_URL`              | `http://localhost:8000`        |
    /// | `LOOM_WS_URL`               | derived from `LOOM_API_URL`    |
    /// | `LOOM_REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `LOOM_POLL_INTERVAL_MS`     | `3000`                         |
    /// | `LOOM_MAX_POLLS`            | `20`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("LOOM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::for_api_url(&api_url);

        if let Some(ws_url) = lookup("LOOM_WS_URL").filter(|v| !v.trim().is_empty()) {
            config.ws_url = ws_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("LOOM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_positive(
                "LOOM_REQUEST_TIMEOUT_SECS",
                &raw,
            )?);
        }
        if let Some(raw) = lookup("LOOM_POLL_INTERVAL_MS") {
            config.poll_interval =
                Duration::from_millis(parse_positive("LOOM_POLL_INTERVAL_MS", &raw)?);
        }
        if let Some(raw) = lookup("LOOM_MAX_POLLS") {
            let max = parse_positive("LOOM_MAX_POLLS", &raw)?;
            config.max_polls = u32::try_from(max).map_err(|_| ConfigError::Invalid {
                name: "LOOM_MAX_POLLS",
                expected: "a positive 32-bit integer",
                value: raw.clone(),
            })?;
        }
        Ok(config)
    }
}

/// `http://host` -> `ws://host`, `https://host` -> `wss://host`.
///
/// URLs without an HTTP scheme are returned unchanged.
pub fn derive_ws_url(api_url: &str) -> String {
    let api_url = api_url.trim_end_matches('/');
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a positive integer",
            value: raw.to_string(),
        }),
    }
}
