//! Deployment configuration.
//!
//! One TOML file describes the measurement API, the session credential,
//! the registry of known sensors and the households with their deployment
//! timeframes:
//!
//! ```toml
//! [server]
//! base_url = "https://samsmart.example.org/api/data"
//! timeout_secs = 10
//!
//! [user]
//! od_session = "0123456789abcdef"
//!
//! [available_sensors]
//! Gas = "cardinal"
//! Bewegung = { role = "nominal", aggregation = "max" }
//!
//! [households.haushalt1]
//! timeframes = [
//!   { tag = "haushalt1", source = "koffer1", oldest_record = "2024-01-01T00:00:00Z", newest_record = "2024-01-10T00:00:00Z" },
//! ]
//! ```
//!
//! [`Config::load_validated`] is the single entry point that turns such a
//! file into a checked [`Deployment`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use samsmart_types::{Household, ParseError, Source, Tag, Timeframe};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::error::Result;
use crate::registry::SensorRegistry;
use crate::timeframes::check_households;

/// Households keyed by id.
pub type Households = BTreeMap<String, Household>;

/// Raw configuration as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Measurement API settings.
    pub server: ServerConfig,
    /// Credentials.
    pub user: UserConfig,
    /// Known sensors and their capabilities.
    pub available_sensors: SensorRegistry,
    /// Households and their deployments.
    pub households: BTreeMap<String, HouseholdConfig>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Toml)
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - The API base URL uses http or https
    /// - The request timeout is between 1 and 300 seconds
    /// - A session credential is set
    /// - At least one sensor is registered
    /// - Every timeframe tag is valid
    /// - No timeframe ends before it starts
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.user.validate());

        if self.available_sensors.is_empty() {
            errors.push(ValidationError {
                field: "available_sensors".to_string(),
                message: "at least one sensor must be registered".to_string(),
            });
        }

        for (id, household) in &self.households {
            for (i, timeframe) in household.timeframes.iter().enumerate() {
                let prefix = format!("households.{}.timeframes[{}]", id, i);
                errors.extend(timeframe.validate(&prefix));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Turn every configured timeframe into a [`Timeframe`].
    ///
    /// Open-ended timeframes end at `now`. No overlap check is done here.
    pub fn resolve(&self, now: OffsetDateTime) -> std::result::Result<Households, ConfigError> {
        let mut households = Households::new();
        for (id, household) in &self.households {
            let mut timeframes = Vec::with_capacity(household.timeframes.len());
            for (i, timeframe) in household.timeframes.iter().enumerate() {
                let resolved = timeframe.resolve(now).map_err(|e| {
                    ConfigError::Validation(vec![ValidationError {
                        field: format!("households.{}.timeframes[{}]", id, i),
                        message: e.to_string(),
                    }])
                })?;
                timeframes.push(resolved);
            }
            households.insert(id.clone(), Household::new(timeframes));
        }
        Ok(households)
    }

    /// Load, validate and resolve configuration from a file.
    ///
    /// Open-ended timeframes end at `now`. Timeframes of the same source
    /// are checked for overlap across all households.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the file cannot be
    /// read or is invalid and [`Error::OverlapViolation`](crate::Error::OverlapViolation)
    /// if one source is deployed twice at the same time.
    pub fn load_validated<P: AsRef<Path>>(path: P, now: OffsetDateTime) -> Result<Deployment> {
        let config = Self::load(path)?;
        config.into_deployment(now)
    }

    /// Validate and resolve an already loaded configuration.
    ///
    /// See [`Config::load_validated`].
    pub fn into_deployment(self, now: OffsetDateTime) -> Result<Deployment> {
        self.validate()?;
        let households = self.resolve(now)?;
        check_households(households.values())?;
        info!(
            "Loaded {} sensors and {} households",
            self.available_sensors.len(),
            households.len()
        );
        Ok(Deployment {
            server: self.server,
            user: self.user,
            sensors: self.available_sensors,
            households,
        })
    }
}

/// A validated configuration with resolved timeframes.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Measurement API settings.
    pub server: ServerConfig,
    /// Credentials.
    pub user: UserConfig,
    /// Known sensors.
    pub sensors: SensorRegistry,
    /// Households whose timeframes passed the overlap check.
    pub households: Households,
}

/// Measurement API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the data API (e.g., `https://host/api/data`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api/data".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.base_url.is_empty() {
            errors.push(ValidationError {
                field: "server.base_url".to_string(),
                message: "base URL cannot be empty".to_string(),
            });
        } else if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "server.base_url".to_string(),
                message: format!(
                    "base URL '{}' must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            errors.push(ValidationError {
                field: "server.timeout_secs".to_string(),
                message: format!(
                    "timeout must be between 1 and 300 seconds, got {}",
                    self.timeout_secs
                ),
            });
        }

        errors
    }
}

/// Credentials for the data API.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Value of the `OD-SESSION` header.
    pub od_session: String,
}

impl UserConfig {
    /// Validate user configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        if self.od_session.trim().is_empty() {
            vec![ValidationError {
                field: "user.od_session".to_string(),
                message: "session credential cannot be empty".to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("od_session", &"<redacted>")
            .finish()
    }
}

/// Deployments of one household.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdConfig {
    /// Deployment windows.
    pub timeframes: Vec<TimeframeConfig>,
}

/// One configured deployment window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeConfig {
    /// Location tag; defaults to the source label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Deployed box.
    pub source: Source,
    /// Inclusive lower bound.
    #[serde(with = "time::serde::rfc3339")]
    pub oldest_record: OffsetDateTime,
    /// Inclusive upper bound; open-ended when absent.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub newest_record: Option<OffsetDateTime>,
}

impl TimeframeConfig {
    /// Validate one timeframe.
    pub fn validate(&self, prefix: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(tag) = &self.tag
            && let Err(e) = tag.parse::<Tag>()
        {
            errors.push(ValidationError {
                field: format!("{}.tag", prefix),
                message: e.to_string(),
            });
        }

        if let Some(newest) = self.newest_record
            && newest < self.oldest_record
        {
            errors.push(ValidationError {
                field: format!("{}.newest_record", prefix),
                message: format!(
                    "newest_record {} lies before oldest_record {}",
                    newest, self.oldest_record
                ),
            });
        }

        errors
    }

    /// Build the [`Timeframe`], ending open-ended windows at `now`.
    pub fn resolve(&self, now: OffsetDateTime) -> std::result::Result<Timeframe, ParseError> {
        let tag = match &self.tag {
            Some(tag) => tag.parse()?,
            None => Tag::for_source(self.source),
        };
        Timeframe::new(tag, self.source, self.oldest_record, self.newest_record, now)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to parse config: {0}")]
    Toml(toml::de::Error),
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `server.base_url` or `households.h1.timeframes[0].tag`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("samsmart")
        .join("config.toml")
}
