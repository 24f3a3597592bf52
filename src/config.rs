use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::database::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Default per-attempt connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to reach the database server
///
/// The server settings have no defaults: a missing host, database name or
/// user makes every connection attempt fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,

    /// Network-level timeout of a single connection attempt
    pub connect_timeout: Duration,

    /// Total connection attempts
    pub retry_attempts: u32,

    /// Pause between connection attempts
    pub retry_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dbname: None,
            user: None,
            password: None,
            host: None,
            port: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ConnectionConfig {
    /// Load connection settings from `.env`, the config file and the environment
    ///
    /// Later sources win: config file, then `POSTGRES_*` variables (`POSTGRES_DB`,
    /// `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_HOST`, `POSTGRES_PORT`),
    /// then `PGSETUP_*` variables for the tool's own knobs
    /// (`PGSETUP_CONNECT_TIMEOUT_SECS`, `PGSETUP_RETRY_ATTEMPTS`, `PGSETUP_RETRY_DELAY_SECS`).
    pub fn load(path: &Option<String>) -> Result<ConnectionConfig> {
        // values already in the environment take precedence over .env
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(anyhow!("Failed to load .env file: {}", e));
            }
        }

        let mut builder = Config::builder();

        match path {
            Some(p) => {
                if !Path::new(p).exists() {
                    return Err(anyhow!("Config file '{}' does not exist", p));
                }
                builder = builder.add_source(config::File::with_name(p.as_str()));
            }
            None => {
                let p = Self::config_file_path();
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                }
            }
        }

        builder = builder
            .add_source(config::Environment::with_prefix("POSTGRES"))
            .add_source(config::Environment::with_prefix("PGSETUP"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_settings(&config)
    }

    /// Build from flattened `key -> value` settings
    ///
    /// Empty values count as unset.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<ConnectionConfig> {
        let get = |key: &str| {
            settings
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let port = match get("port") {
            Some(p) => Some(parse_value::<u16>("port", &p)?),
            None => None,
        };

        let connect_timeout = match get("connect_timeout_secs") {
            Some(s) => Duration::from_secs(parse_value("connect_timeout_secs", &s)?),
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        let retry_attempts = match get("retry_attempts") {
            Some(s) => parse_value("retry_attempts", &s)?,
            None => DEFAULT_RETRY_ATTEMPTS,
        };

        let retry_delay = match get("retry_delay_secs") {
            Some(s) => Duration::from_secs(parse_value("retry_delay_secs", &s)?),
            None => DEFAULT_RETRY_DELAY,
        };

        Ok(ConnectionConfig {
            dbname: get("db"),
            user: get("user"),
            // passwords keep their whitespace
            password: settings.get("password").filter(|v| !v.is_empty()).cloned(),
            host: get("host"),
            port,
            connect_timeout,
            retry_attempts,
            retry_delay,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }

    /// Display configuration summary, password masked
    pub fn summary(&self) -> String {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
        let lines = [
            format!("Database:           {}", show(&self.dbname)),
            format!("User:               {}", show(&self.user)),
            format!(
                "Password:           {}",
                if self.password.is_some() {
                    "********"
                } else {
                    "(not set)"
                }
            ),
            format!("Host:               {}", show(&self.host)),
            format!(
                "Port:               {}",
                self.port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "(default)".to_string())
            ),
            format!(
                "Connect Timeout:    {} seconds",
                self.connect_timeout.as_secs()
            ),
            format!("Retry Attempts:     {}", self.retry_attempts),
            format!("Retry Delay:        {} seconds", self.retry_delay.as_secs()),
        ];
        lines.join("\n")
    }

    /// Serializable view for machine-readable output, password masked
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            password_set: self.password.is_some(),
            host: self.host.clone(),
            port: self.port,
            connect_timeout_secs: self.connect_timeout.as_secs(),
            retry_attempts: self.retry_attempts,
            retry_delay_secs: self.retry_delay.as_secs(),
        }
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.pgsetup/pgsetup.toml", home_dir)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}

/// Connection settings as shown to users
#[derive(Debug, Serialize, Clone)]
pub struct ConnectionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub password_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub connect_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}
