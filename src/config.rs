//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Estimates and thresholds used by the diff engine and the plan generator
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// A plan is `high` risk once it has more than this many high-risk steps
    pub high_risk_step_threshold: usize,
    /// A diff is `high` impact once it has more than this many breaking changes
    pub breaking_impact_threshold: usize,
    pub backup_minutes: u32,
    pub validation_minutes: u32,
    pub data_restore_minutes: u32,
    /// Floor for the schema rollback step estimate
    pub rollback_minimum_minutes: u32,
    pub critical_change_minutes: u32,
    pub high_change_minutes: u32,
    pub medium_change_minutes: u32,
    pub low_change_minutes: u32,
    pub max_retries: u32,
    /// Data restore steps up to this count are `minimal` data loss risk
    pub minimal_data_loss_steps: usize,
    /// Data restore steps up to this count are `moderate` data loss risk
    pub moderate_data_loss_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            high_risk_step_threshold: 2,
            breaking_impact_threshold: 3,
            backup_minutes: 5,
            validation_minutes: 3,
            data_restore_minutes: 10,
            rollback_minimum_minutes: 5,
            critical_change_minutes: 30,
            high_change_minutes: 15,
            medium_change_minutes: 5,
            low_change_minutes: 2,
            max_retries: 3,
            minimal_data_loss_steps: 1,
            moderate_data_loss_steps: 3,
        }
    }
}

/// Engine-level configuration
#[derive(Debug, Clone)]
pub struct VersioningConfig {
    pub planner: PlannerConfig,
    /// Buffered events per subscriber before lagging receivers drop events
    pub event_channel_capacity: usize,
    /// Attach heuristic analysis to versions and diffs
    pub analysis_enabled: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            event_channel_capacity: 256,
            analysis_enabled: true,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub versioning: VersioningConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let defaults = Settings::default();

        let server = ServerConfig {
            host: env_or("HOST", defaults.server.host)?,
            port: env_or("PORT", defaults.server.port)?,
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors.allowed_origins),
        };

        let planner_defaults = defaults.versioning.planner;
        let planner = PlannerConfig {
            high_risk_step_threshold: env_or(
                "PLANNER_HIGH_RISK_STEP_THRESHOLD",
                planner_defaults.high_risk_step_threshold,
            )?,
            breaking_impact_threshold: env_or(
                "PLANNER_BREAKING_IMPACT_THRESHOLD",
                planner_defaults.breaking_impact_threshold,
            )?,
            backup_minutes: env_or("PLANNER_BACKUP_MINUTES", planner_defaults.backup_minutes)?,
            validation_minutes: env_or(
                "PLANNER_VALIDATION_MINUTES",
                planner_defaults.validation_minutes,
            )?,
            data_restore_minutes: env_or(
                "PLANNER_DATA_RESTORE_MINUTES",
                planner_defaults.data_restore_minutes,
            )?,
            ..planner_defaults
        };

        let versioning = VersioningConfig {
            planner,
            event_channel_capacity: env_or(
                "EVENT_CHANNEL_CAPACITY",
                defaults.versioning.event_channel_capacity,
            )?,
            analysis_enabled: env_or("ANALYSIS_ENABLED", defaults.versioning.analysis_enabled)?,
        };

        if versioning.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "EVENT_CHANNEL_CAPACITY must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server,
            cors,
            versioning,
        })
    }
}

/// Read `key` from the environment, falling back to `default` when unset
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    parse_var(key, std::env::var(key).ok(), default)
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{} has invalid value '{}'", key, value))
        }),
    }
}
