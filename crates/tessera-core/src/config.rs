use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_AVAILABILITY_MARGIN_MINUTES, MAX_RECURRENCE_ITERATIONS};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Forward margin, in minutes, added to "available now" queries.
    pub availability_margin_minutes: i64,
    /// Ceiling on recurrence generation iterations.
    pub recurrence_iteration_limit: usize,
}

impl SchedulingConfig {
    /// ## Summary
    /// Returns the availability margin as a `chrono::TimeDelta`.
    #[must_use]
    pub fn availability_margin(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(self.availability_margin_minutes)
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default(
                "scheduling.availability_margin_minutes",
                DEFAULT_AVAILABILITY_MARGIN_MINUTES,
            )?
            .set_default(
                "scheduling.recurrence_iteration_limit",
                u64::try_from(MAX_RECURRENCE_ITERATIONS)?,
            )?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
