use crate::listing::DEFAULT_PAGE_SIZE;
use crate::locale::Locale;
use crate::workflows::registration::DEFAULT_MAX_RENEWAL_YEARS;
use crate::workflows::review::VerificationPolicy;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub review: ReviewConfig,
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

        let require_document = match env::var("APP_REQUIRE_EVIDENCE_DOCUMENT") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                key: "APP_REQUIRE_EVIDENCE_DOCUMENT",
            })?,
            Err(_) => false,
        };
        let verification_policy = if require_document {
            VerificationPolicy::RequireDocument
        } else {
            VerificationPolicy::AllowWithoutDocument
        };

        let default_locale = match env::var("APP_DEFAULT_LOCALE") {
            Ok(raw) => Locale::from_tag(&raw).ok_or(ConfigError::InvalidLocale(raw))?,
            Err(_) => Locale::En,
        };

        let page_size = parse_positive("APP_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_renewal_years =
            parse_positive("APP_MAX_RENEWAL_YEARS", DEFAULT_MAX_RENEWAL_YEARS)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            review: ReviewConfig {
                verification_policy,
                default_locale,
                page_size,
                max_renewal_years,
            },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_positive<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::InvalidPositive { key }),
        },
        Err(_) => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Reviewer-facing policy dials shared by the review and registry services.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub verification_policy: VerificationPolicy,
    pub default_locale: Locale,
    pub page_size: usize,
    pub max_renewal_years: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            verification_policy: VerificationPolicy::default(),
            default_locale: Locale::En,
            page_size: DEFAULT_PAGE_SIZE,
            max_renewal_years: DEFAULT_MAX_RENEWAL_YEARS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { key: &'static str },
    InvalidPositive { key: &'static str },
    InvalidLocale(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { key } => {
                write!(f, "{key} must be one of true/false/1/0/yes/no")
            }
            ConfigError::InvalidPositive { key } => {
                write!(f, "{key} must be a positive integer")
            }
            ConfigError::InvalidLocale(raw) => {
                write!(f, "APP_DEFAULT_LOCALE '{raw}' is not a supported locale")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
