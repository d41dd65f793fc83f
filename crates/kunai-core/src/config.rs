use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::DEFAULT_PRODID;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub expansion: ExpansionConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Bounds and fallbacks used when expanding recurring events.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionConfig {
    /// Zone used when neither the caller, the DTSTART property, nor the
    /// calendar names one.
    pub default_timezone: String,
    /// Most occurrences generated per refill of a rule's window.
    pub max_occurrences: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Honour `SCHEDULE-AGENT=CLIENT` on attendees (RFC 6638 §7.1).
    pub schedule_agent_server_rules: bool,
    /// PRODID written into outbound iTip payloads.
    pub prodid: String,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            max_occurrences: 10_000,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            schedule_agent_server_rules: true,
            prodid: DEFAULT_PRODID.to_string(),
        }
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
            .set_default("logging.level", "info")?
            .set_default("expansion.default_timezone", "UTC")?
            .set_default("expansion.max_occurrences", 10_000)?
            .set_default("scheduling.schedule_agent_server_rules", true)?
            .set_default("scheduling.prodid", DEFAULT_PRODID)?
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

    let settings = Settings::load()?;
    tracing::debug!(
        default_timezone = %settings.expansion.default_timezone,
        max_occurrences = settings.expansion.max_occurrences,
        "Settings loaded"
    );
    Ok(settings)
}
