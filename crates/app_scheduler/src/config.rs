//! Scheduler configuration

use serde::Deserialize;

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/invoicing".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("SCHEDULER"))
            .build()?
            .try_deserialize()
    }
}
