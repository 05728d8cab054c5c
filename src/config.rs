//! Process configuration, read from environment variables.
//!
//! | variable            | default                 |
//! |---------------------|-------------------------|
//! | `ML_API_URL`        | unset (demo mode)       |
//! | `ML_LOCAL_FALLBACK` | `false`                 |
//! | `ML_LOCAL_URL`      | `http://localhost:5000` |
//! | `ML_TIMEOUT_SECS`   | `10`                    |
//! | `HOST`              | `127.0.0.1`             |
//! | `PORT`              | `8080`                  |

use std::time::Duration;

pub const DEFAULT_LOCAL_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external inference service.
    pub ml_api_url: Option<String>,
    /// Try the local development service after the external one.
    pub local_fallback: bool,
    pub local_url: String,
    /// Deadline for each candidate in the resolution chain.
    pub timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ml_api_url: None,
            local_fallback: false,
            local_url: DEFAULT_LOCAL_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let local_fallback = match get("ML_LOCAL_FALLBACK") {
            Some(value) => parse_flag("ML_LOCAL_FALLBACK", value)?,
            None => defaults.local_fallback,
        };

        let timeout = match get("ML_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ML_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => defaults.timeout,
        };

        let port = match get("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => defaults.port,
        };

        Ok(Self {
            ml_api_url: get("ML_API_URL").map(|url| url.trim_end_matches('/').to_string()),
            local_fallback,
            local_url: get("ML_LOCAL_URL").unwrap_or(defaults.local_url),
            timeout,
            host: get("HOST").unwrap_or(defaults.host),
            port,
        })
    }
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
