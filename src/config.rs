//! Service configuration from environment variables.

use std::time::Duration;

/// Default refresh-coordinator tick interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5000;

/// How long the busy indicator lingers after a successful cycle.
pub const DEFAULT_BUSY_LINGER_MS: u64 = 500;

/// Default market simulator step interval.
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 3000;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the API server binds to.
    pub host: String,
    /// Port the API server listens on.
    pub port: u16,
    /// Enable permissive CORS (development default).
    pub enable_cors: bool,
    /// Refresh coordinator tick interval.
    pub tick_interval: Duration,
    /// Busy-indicator linger after a successful cycle.
    pub busy_linger: Duration,
    /// Market simulator step interval; zero disables the simulator.
    pub feed_interval: Duration,
    /// Base URL the refresh coordinator polls. Defaults to the local server.
    pub api_base: String,
    /// Per-request timeout for the API client.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            busy_linger: Duration::from_millis(DEFAULT_BUSY_LINGER_MS),
            feed_interval: Duration::from_millis(DEFAULT_FEED_INTERVAL_MS),
            api_base: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("DECK_HOST").unwrap_or(defaults.host);
        let port = env_parse("DECK_PORT", defaults.port);

        Self {
            enable_cors: std::env::var("DECK_CORS")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(defaults.enable_cors),
            tick_interval: Duration::from_millis(env_parse(
                "DECK_TICK_INTERVAL_MS",
                DEFAULT_TICK_INTERVAL_MS,
            )),
            busy_linger: Duration::from_millis(env_parse(
                "DECK_BUSY_LINGER_MS",
                DEFAULT_BUSY_LINGER_MS,
            )),
            feed_interval: Duration::from_millis(env_parse(
                "DECK_FEED_INTERVAL_MS",
                DEFAULT_FEED_INTERVAL_MS,
            )),
            api_base: std::env::var("DECK_API_BASE")
                .unwrap_or_else(|_| format!("http://{}:{}", host, port)),
            request_timeout: Duration::from_secs(env_parse("DECK_REQUEST_TIMEOUT_SECS", 10)),
            host,
            port,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
