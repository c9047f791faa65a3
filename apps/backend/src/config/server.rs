use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::config::game::GameConfig;
use crate::error::AppError;

/// Process-level settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Countdown cadence. One tick is one "second" of turn time.
    pub tick_interval: Duration,
    /// Rules new sessions start with.
    pub game_defaults: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tick_interval: Duration::from_secs(1),
            game_defaults: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `BACKEND_HOST`, `BACKEND_PORT`, `GAME_TICK_MILLIS` and
    /// `GAME_WAIT_TIME_SECS`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let host = lookup("BACKEND_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "BACKEND_PORT", defaults.port)?;
        let tick_millis = parse_var(&lookup, "GAME_TICK_MILLIS", 1000u64)?;
        if tick_millis == 0 {
            return Err(AppError::config("GAME_TICK_MILLIS must be positive"));
        }

        let mut game_defaults = defaults.game_defaults;
        game_defaults.wait_time_secs =
            parse_var(&lookup, "GAME_WAIT_TIME_SECS", game_defaults.wait_time_secs)?;
        game_defaults
            .validate()
            .map_err(|err| AppError::config(format!("invalid game defaults: {err}")))?;

        Ok(Self {
            host,
            port,
            tick_interval: Duration::from_millis(tick_millis),
            game_defaults,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{key} has an invalid value: '{raw}'"))),
    }
}
