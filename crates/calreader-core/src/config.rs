use std::str::FromStr;

use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;

use crate::constants::{
    APP_NAME, CONFIG_FILE, DEFAULT_DAYS_AHEAD, DEFAULT_DAYS_BACK, DEFAULT_MAX_INSTANCES,
    DEFAULT_TIME_ZONE,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Whole days before today that stay in the caching window.
    pub days_back: u32,
    /// Whole days after today that stay in the caching window.
    pub days_ahead: u32,
    /// IANA name of the zone occurrences are reported in.
    pub time_zone: String,
    /// Cap on instances a single recurring event may produce.
    pub max_instances: u16,
}

impl ImportConfig {
    /// ## Summary
    /// Resolves the configured zone name.
    ///
    /// ## Errors
    /// Returns `CoreError::UnknownTimeZone` if the name is not an IANA zone.
    pub fn time_zone(&self) -> CoreResult<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(self.time_zone.trim())
            .map_err(|_e| CoreError::UnknownTimeZone(self.time_zone.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("import.days_back", i64::from(DEFAULT_DAYS_BACK))?
            .set_default("import.days_ahead", i64::from(DEFAULT_DAYS_AHEAD))?
            .set_default("import.time_zone", DEFAULT_TIME_ZONE)?
            .set_default("import.max_instances", i64::from(DEFAULT_MAX_INSTANCES))?
            .set_default("logging.level", "info")?)
    }

    /// ## Summary
    /// Loads configuration from environment variables and an optional `calreader.toml`.
    ///
    /// Environment keys look like `CALREADER_IMPORT__DAYS_BACK`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Self::with_defaults()?
            .add_source(
                config::Environment::with_prefix(&APP_NAME.to_ascii_uppercase())
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Loads configuration from TOML text on top of the defaults.
    ///
    /// ## Errors
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Self::with_defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks values the deserializer cannot.
    ///
    /// ## Errors
    /// Returns a `CoreError` for an unknown zone or a zero instance cap.
    pub fn validate(&self) -> CoreResult<()> {
        self.import.time_zone()?;
        if self.import.max_instances == 0 {
            return Err(CoreError::InvalidConfiguration(
                "import.max_instances must be at least 1".to_string(),
            ));
        }
        Ok(())
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
        days_back = settings.import.days_back,
        days_ahead = settings.import.days_ahead,
        time_zone = %settings.import.time_zone,
        "Configuration loaded"
    );
    Ok(settings)
}
