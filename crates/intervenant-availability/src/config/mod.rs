use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::workflows::availability::{
    Engagement, EngagementError, RequirementError, WeekId, WorkweekCalendar,
};

const DEFAULT_REQUIRED_HOURS: f64 = 20.0;

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
    pub availability: AvailabilityConfig,
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
            availability: AvailabilityConfig::from_env()?,
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

/// Engagement window, weekly requirements and record source.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityConfig {
    pub engagement: Option<Engagement>,
    pub required_hours: f64,
    pub required_hours_overrides: Vec<(WeekId, f64)>,
    pub seed_path: Option<PathBuf>,
}

impl AvailabilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let start = optional_date("APP_ENGAGEMENT_START")?;
        let end = optional_date("APP_ENGAGEMENT_END")?;
        let engagement = match (start, end) {
            (Some(start), Some(end)) => Some(Engagement::new(start, end)?),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteEngagement),
        };

        let required_hours = match env::var("APP_REQUIRED_HOURS") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidRequiredHours(raw.clone()))?,
            Err(_) => DEFAULT_REQUIRED_HOURS,
        };

        let required_hours_overrides = match env::var("APP_REQUIRED_HOURS_OVERRIDES") {
            Ok(raw) => parse_overrides(&raw)?,
            Err(_) => Vec::new(),
        };

        let seed_path = env::var("APP_SEED_PATH")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            engagement,
            required_hours,
            required_hours_overrides,
            seed_path,
        })
    }

    pub fn engagement(&self) -> Result<Engagement, ConfigError> {
        self.engagement.ok_or(ConfigError::MissingEngagement)
    }

    /// Build the weekly requirement calendar from the configured minimum and overrides.
    pub fn workweek_calendar(&self) -> Result<WorkweekCalendar, RequirementError> {
        self.required_hours_overrides.iter().try_fold(
            WorkweekCalendar::new(self.required_hours)?,
            |calendar, (week, hours)| calendar.with_override(*week, *hours),
        )
    }
}

fn optional_date(var: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    match env::var(var) {
        Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ConfigError::InvalidDate { var, value: raw }),
        Err(_) => Ok(None),
    }
}

/// Parse `2024-W10=12,2024-W11=8`. Each week may appear once.
fn parse_overrides(raw: &str) -> Result<Vec<(WeekId, f64)>, ConfigError> {
    let mut seen = BTreeSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidOverride(entry.to_string());
            let (week, hours) = entry.split_once('=').ok_or_else(invalid)?;
            let week = week.trim().parse::<WeekId>().map_err(|_| invalid())?;
            let hours = hours.trim().parse::<f64>().map_err(|_| invalid())?;
            if !seen.insert(week) {
                return Err(invalid());
            }
            Ok((week, hours))
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDate { var: &'static str, value: String },
    IncompleteEngagement,
    InvalidEngagement(EngagementError),
    MissingEngagement,
    InvalidRequiredHours(String),
    InvalidOverride(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDate { var, value } => {
                write!(f, "{var} must be a YYYY-MM-DD date (found '{value}')")
            }
            ConfigError::IncompleteEngagement => write!(
                f,
                "APP_ENGAGEMENT_START and APP_ENGAGEMENT_END must be set together"
            ),
            ConfigError::InvalidEngagement(err) => write!(f, "invalid engagement: {err}"),
            ConfigError::MissingEngagement => write!(
                f,
                "no engagement configured (set APP_ENGAGEMENT_START and APP_ENGAGEMENT_END)"
            ),
            ConfigError::InvalidRequiredHours(value) => {
                write!(f, "APP_REQUIRED_HOURS must be a number (found '{value}')")
            }
            ConfigError::InvalidOverride(entry) => write!(
                f,
                "APP_REQUIRED_HOURS_OVERRIDES entry '{entry}' must look like 2024-W10=12"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidEngagement(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngagementError> for ConfigError {
    fn from(value: EngagementError) -> Self {
        Self::InvalidEngagement(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ENGAGEMENT_START",
            "APP_ENGAGEMENT_END",
            "APP_REQUIRED_HOURS",
            "APP_REQUIRED_HOURS_OVERRIDES",
            "APP_SEED_PATH",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.availability.engagement, None);
        assert_eq!(config.availability.required_hours, DEFAULT_REQUIRED_HOURS);
        assert!(config.availability.required_hours_overrides.is_empty());
        assert!(matches!(
            config.availability.engagement(),
            Err(ConfigError::MissingEngagement)
        ));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_engagement_and_requirement_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENGAGEMENT_START", "2024-03-04");
        env::set_var("APP_ENGAGEMENT_END", "2024-03-15");
        env::set_var("APP_REQUIRED_HOURS", "18.5");
        env::set_var("APP_REQUIRED_HOURS_OVERRIDES", "2024-W11=6, 2024-W10=0");

        let config = AppConfig::load().expect("config loads");
        let engagement = config.availability.engagement().expect("engagement set");
        assert_eq!(engagement.weeks().len(), 2);

        let calendar = config
            .availability
            .workweek_calendar()
            .expect("calendar builds");
        assert_eq!(calendar.default_hours(), 18.5);
        assert_eq!(calendar.overrides().len(), 2);
        reset_env();
    }

    #[test]
    fn rejects_half_configured_engagement() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENGAGEMENT_START", "2024-03-04");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::IncompleteEngagement)
        ));
        reset_env();
    }

    #[test]
    fn rejects_malformed_override() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REQUIRED_HOURS_OVERRIDES", "week10:12");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidOverride(_))
        ));
        reset_env();
    }

    #[test]
    fn rejects_repeated_override_week() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REQUIRED_HOURS_OVERRIDES", "2024-W10=12,2024-W10=8");
        match AppConfig::load() {
            Err(ConfigError::InvalidOverride(entry)) => assert_eq!(entry, "2024-W10=8"),
            other => panic!("expected duplicate override rejection, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn negative_required_hours_fail_calendar_construction() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REQUIRED_HOURS", "-4");
        let config = AppConfig::load().expect("numbers parse");
        assert!(matches!(
            config.availability.workweek_calendar(),
            Err(RequirementError::InvalidHours(_))
        ));
        reset_env();
    }
}
