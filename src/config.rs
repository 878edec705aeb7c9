//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use tracing::debug;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A rejected environment value.
#[derive(Debug, Clone, Display, Error)]
#[display("invalid value for {name}: {value:?}")]
pub struct ConfigError {
    /// Environment variable name.
    pub name: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone, Getters)]
pub struct Config {
    /// Bind address.
    host: String,
    /// Bind port.
    port: u16,
    /// Default log level when `RUST_LOG` is unset.
    log_level: String,
    /// Inactivity TTL for stored games.
    game_ttl: Duration,
    /// Location of the learned-policy model, when one is deployed.
    rl_model_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the environment, applying defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_level = env_or("LOG_LEVEL", "info");
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError {
                name: "LOG_LEVEL",
                value: log_level,
            });
        }
        let config = Config {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 3000)?,
            log_level,
            game_ttl: Duration::from_secs(parse_env("GAME_TTL_SECS", 7200u64)?),
            rl_model_path: env_or("RL_MODEL_PATH", "data/model.pt").into(),
        };
        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        // Scoped to variables no other test touches.
        let config = Config::from_env().unwrap();
        assert_eq!(*config.port(), 3000);
        assert_eq!(*config.game_ttl(), Duration::from_secs(7200));
    }
}
