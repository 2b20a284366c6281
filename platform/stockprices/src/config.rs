use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;
use stockchecker::quote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

const DEFAULT_PORT: u16 = 3000;

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub quote_base_url: String,
    pub quote_timeout: Duration,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow!("Invalid server port {:?}: {}", port, e))?,
            None => DEFAULT_PORT,
        };

        let quote_timeout = match lookup("QUOTE_TIMEOUT_MS") {
            Some(timeout) => match timeout.parse::<u64>() {
                Ok(0) => return Err(anyhow!("QUOTE_TIMEOUT_MS must be greater than zero")),
                Ok(millis) => Duration::from_millis(millis),
                Err(e) => return Err(anyhow!("Invalid QUOTE_TIMEOUT_MS {:?}: {}", timeout, e)),
            },
            None => DEFAULT_TIMEOUT,
        };

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(max) => max
                .parse::<u32>()
                .map_err(|e| anyhow!("Invalid DATABASE_MAX_CONNECTIONS {:?}: {}", max, e))?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };

        let trust_proxy = match lookup("TRUST_PROXY") {
            Some(flag) => parse_flag(&flag)
                .ok_or_else(|| anyhow!("Invalid TRUST_PROXY {:?}", flag))?,
            None => false,
        };

        Ok(Config {
            host: lookup("SERVER_HOST").unwrap_or("0.0.0.0".to_string()),
            port,
            quote_base_url: lookup("QUOTE_BASE_URL").unwrap_or(DEFAULT_BASE_URL.to_string()),
            quote_timeout,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections,
            trust_proxy,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
