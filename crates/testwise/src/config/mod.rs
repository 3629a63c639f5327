use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::survey::domain::UserId;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_HISTORY_MAX_LIMIT: usize = 200;

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
    pub survey: SurveyConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            survey: SurveyConfig::from_env()?,
        })
    }
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

/// Questionnaire data source and history paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyConfig {
    /// Catalog document to load instead of the bundled one.
    pub catalog_path: Option<PathBuf>,
    pub history: HistoryLimits,
    /// Users registered in the in-memory directory at startup.
    pub seed_users: Vec<UserId>,
}

impl SurveyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let catalog_path = env::var("APP_CATALOG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let default_limit = parse_usize("APP_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?;
        let max_limit = parse_usize("APP_HISTORY_MAX_LIMIT", DEFAULT_HISTORY_MAX_LIMIT)?;

        let seed_users = match env::var("APP_SEED_USERS") {
            Ok(raw) => parse_user_ids(&raw)?,
            Err(_) => vec![UserId(1)],
        };

        Ok(Self {
            catalog_path,
            history: HistoryLimits::new(default_limit, max_limit),
            seed_users,
        })
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            history: HistoryLimits::default(),
            seed_users: vec![UserId(1)],
        }
    }
}

/// Paging bounds applied to result history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    default_limit: usize,
    max_limit: usize,
}

impl HistoryLimits {
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        let max_limit = if max_limit == 0 {
            DEFAULT_HISTORY_MAX_LIMIT
        } else {
            max_limit
        };
        let default_limit = match default_limit {
            0 => DEFAULT_HISTORY_LIMIT.min(max_limit),
            limit => limit.min(max_limit),
        };

        Self {
            default_limit,
            max_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Resolve a caller supplied limit; 0 means "use the default".
    pub fn clamp(&self, requested: usize) -> usize {
        match requested {
            0 => self.default_limit,
            limit => limit.min(self.max_limit),
        }
    }
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_MAX_LIMIT)
    }
}

fn parse_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn parse_user_ids(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<u64>()
                .map(UserId)
                .map_err(|_| ConfigError::InvalidUserId {
                    value: value.to_string(),
                })
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidUserId { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidUserId { value } => {
                write!(f, "APP_SEED_USERS contains invalid user id '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidUserId { .. } => None,
        }
    }
}
