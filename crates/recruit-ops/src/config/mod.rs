use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::eligibility::{BlockDuration, PolicyConfig};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: PolicyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let eligibility = load_policy_config()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            eligibility,
        })
    }
}

fn load_policy_config() -> Result<PolicyConfig, ConfigError> {
    let defaults = PolicyConfig::default();

    let decline_threshold = match env::var("ELIGIBILITY_DECLINE_THRESHOLD") {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => return Err(ConfigError::InvalidDeclineThreshold(raw)),
        },
        Err(_) => defaults.decline_threshold,
    };

    let default_block_duration = match env::var("ELIGIBILITY_DEFAULT_BLOCK_MONTHS") {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|months| BlockDuration::from_months(months).ok())
            .ok_or(ConfigError::InvalidBlockDuration(raw))?,
        Err(_) => defaults.default_block_duration,
    };

    Ok(PolicyConfig {
        decline_threshold,
        default_block_duration,
    })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDeclineThreshold(String),
    InvalidBlockDuration(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDeclineThreshold(raw) => write!(
                f,
                "ELIGIBILITY_DECLINE_THRESHOLD must be a positive integer (got '{raw}')"
            ),
            ConfigError::InvalidBlockDuration(raw) => write!(
                f,
                "ELIGIBILITY_DEFAULT_BLOCK_MONTHS must be 3, 6 or 12 (got '{raw}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDeclineThreshold(_)
            | ConfigError::InvalidBlockDuration(_) => None,
        }
    }
}
