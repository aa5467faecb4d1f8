use crate::inspection::bank::{
    standard_locations, BankError, InspectionCatalog, QuestionBank, DEFAULT_ACCENT_COLOR,
};
use crate::report::Rgb;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub inspection: InspectionConfig,
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
            inspection: InspectionConfig::from_env()?,
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

/// Static inspection data, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionConfig {
    /// JSON question bank replacing the bundled one.
    pub bank_path: Option<PathBuf>,
    pub locations: Vec<String>,
    pub accent_color: String,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            bank_path: None,
            locations: standard_locations(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        }
    }
}

impl InspectionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bank_path = env::var("INSPECTION_BANK_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let locations = match env::var("INSPECTION_LOCATIONS") {
            Ok(raw) => parse_locations(&raw),
            Err(_) => standard_locations(),
        };
        if locations.is_empty() {
            return Err(ConfigError::NoLocations);
        }

        let accent_color = env::var("INSPECTION_ACCENT_COLOR")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_ACCENT_COLOR.to_string());
        if Rgb::from_hex(&accent_color).is_none() {
            return Err(ConfigError::InvalidAccentColor {
                value: accent_color,
            });
        }

        Ok(Self {
            bank_path,
            locations,
            accent_color,
        })
    }

    pub fn catalog(&self) -> Result<InspectionCatalog, ConfigError> {
        let bank = match &self.bank_path {
            Some(path) => QuestionBank::from_path(path).map_err(ConfigError::Bank)?,
            None => QuestionBank::standard(),
        };

        InspectionCatalog::new(bank, self.locations.clone(), self.accent_color.clone())
            .map_err(ConfigError::Bank)
    }
}

fn parse_locations(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAccentColor { value: String },
    NoLocations,
    Bank(BankError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAccentColor { value } => {
                write!(f, "INSPECTION_ACCENT_COLOR must be #RRGGBB, got '{value}'")
            }
            ConfigError::NoLocations => {
                write!(f, "INSPECTION_LOCATIONS must name at least one location")
            }
            ConfigError::Bank(err) => write!(f, "question bank: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Bank(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidAccentColor { .. }
            | ConfigError::NoLocations => None,
        }
    }
}
