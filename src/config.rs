//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                | Default        |
//! |-------------------------|----------------|
//! | `LISTEN_ADDR`           | `0.0.0.0:3000` |
//! | `EVENT_BUS_CAPACITY`    | `10000`        |
//! | `ROUND_DEADLINE_MS`     | `10000`        |
//! | `ROUND_GRACE_MS`        | `1000`         |
//! | `QUIZ_BANK_PATH`        | built-in bank  |
//! | `FORFEIT_ON_DISCONNECT` | `true`         |
//! | `LOG_FORMAT`            | `text`         |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::service::{DuelSettings, RoundTiming};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Milliseconds players have to answer a question.
    pub round_deadline_ms: u64,

    /// Milliseconds between a settled round and the next question.
    pub round_grace_ms: u64,

    /// JSON question bank to load instead of the built-in one.
    pub quiz_bank_path: Option<PathBuf>,

    /// End a duel when one of its players disconnects.
    pub forfeit_on_disconnect: bool,

    /// Log output format.
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 10_000);
        let round_deadline_ms = parse_env("ROUND_DEADLINE_MS", 10_000);
        let round_grace_ms = parse_env("ROUND_GRACE_MS", 1_000);
        let quiz_bank_path = std::env::var("QUIZ_BANK_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let forfeit_on_disconnect = parse_env_bool("FORFEIT_ON_DISCONNECT", true);
        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            event_bus_capacity,
            round_deadline_ms,
            round_grace_ms,
            quiz_bank_path,
            forfeit_on_disconnect,
            log_format,
        })
    }

    /// Round timing derived from the configured milliseconds.
    #[must_use]
    pub fn timing(&self) -> RoundTiming {
        RoundTiming {
            deadline: Duration::from_millis(self.round_deadline_ms),
            grace: Duration::from_millis(self.round_grace_ms),
        }
    }

    /// Duel behaviour settings.
    #[must_use]
    pub fn duel_settings(&self) -> DuelSettings {
        DuelSettings {
            timing: self.timing(),
            forfeit_on_disconnect: self.forfeit_on_disconnect,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
