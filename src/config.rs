// src/config.rs

use std::{env, fmt, net::SocketAddr};

use dotenvy::dotenv;
use url::Url;

/// Seconds left on the clock at which the view starts flagging `low_time`.
pub const DEFAULT_LOW_TIME_THRESHOLD_SECS: u32 = 60;

/// Per-call timeout for requests to the remote learning backend.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote backend serving `/attempt/{id}`.
    pub api_base_url: Url,
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub low_time_threshold_secs: u32,
    pub allowed_origins: Vec<String>,
    pub rust_log: String,
    pub log_dir: String,
}

/// Raised when the environment does not describe a usable configuration.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, reason) => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_url =
            env::var("ATTEMPT_API_URL").map_err(|_| ConfigError::Missing("ATTEMPT_API_URL"))?;
        let api_base_url = normalize_base_url(&raw_url)
            .map_err(|e| ConfigError::Invalid("ATTEMPT_API_URL", e))?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid("BIND_ADDR", e.to_string()))?;

        let request_timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let low_time_threshold_secs =
            parse_or("LOW_TIME_THRESHOLD_SECS", DEFAULT_LOW_TIME_THRESHOLD_SECS)?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            api_base_url,
            bind_addr,
            request_timeout_secs,
            low_time_threshold_secs,
            allowed_origins,
            rust_log,
            log_dir,
        })
    }
}

/// Parses a base URL and makes sure it ends with `/` so relative joins keep its path.
pub fn normalize_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Invalid(key, e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_appends_slash() {
        let url = normalize_base_url("http://backend.local/api").unwrap();
        assert_eq!(url.as_str(), "http://backend.local/api/");
        assert_eq!(
            url.join("attempt/7").unwrap().as_str(),
            "http://backend.local/api/attempt/7"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("mailto:someone@example.com").is_err());
    }
}
