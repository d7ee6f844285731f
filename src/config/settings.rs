//! Application settings loaded from `config.toml` and the environment.
//!
//! Every field has a default so an empty or missing file is a valid
//! configuration. `DATABASE_URL` and `EXPENSE_REPORT_URL` from the environment
//! (or a `.env` file) take precedence over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/parish_ledger.sqlite?mode=rwc";
const DEFAULT_EXPENSE_REPORT_URL: &str = "https://parishofdivinemercy.com/backend/report.php";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// sea-orm connection string for the local store
    pub database_url: String,
    /// Donation form behaviour
    pub donations: DonationSettings,
    /// Reminder notifications
    pub reminders: ReminderSettings,
    /// Expense report endpoint
    pub reports: ReportSettings,
}

/// Donation form settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DonationSettings {
    /// Artificial delay before a submission counts as processed
    pub processing_delay_ms: u64,
}

/// Reminder settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Title shown on every reminder notification
    pub notification_title: String,
}

/// Expense report settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Base URL of the expense report resource
    pub endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            donations: DonationSettings::default(),
            reminders: ReminderSettings::default(),
            reports: ReportSettings::default(),
        }
    }
}

impl Default for DonationSettings {
    fn default() -> Self {
        Self {
            processing_delay_ms: 700,
        }
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            notification_title: "Mass Intention Reminder".to_string(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EXPENSE_REPORT_URL.to_string(),
        }
    }
}

impl DonationSettings {
    /// The processing delay as a [`Duration`]
    #[must_use]
    pub const fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file. A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    if !path_ref.exists() {
        info!("No config file at {:?}, using defaults", path_ref);
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads `.env`, then `./config.toml`, then applies environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    let mut config = load_config("config.toml")?;
    apply_env_overrides(&mut config);
    info!("Loaded application configuration");
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    if let Ok(url) = std::env::var("EXPENSE_REPORT_URL") {
        config.reports.endpoint = url;
    }
}
