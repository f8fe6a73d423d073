use crate::shift::ScheduleMode;
use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

pub const DEFAULT_TD_API_URL: &str = "https://api2.timedoctor.com/api/1.0";
pub const DEFAULT_TD_STATS_API_URL: &str = "https://api2.timedoctor.com/api/1.1";
pub const DEFAULT_RAMS_BASE_URL: &str = "https://rumytechnologies.com/rams";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub time_doctor: TimeDoctorConfig,
    #[serde(default)]
    pub rams: RamsConfig,
    /// Normalised RAMS name -> Time Doctor user name ("" = no Time Doctor).
    #[serde(default)]
    pub employees: BTreeMap<String, String>,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScheduleSettings {
    #[serde(default)]
    pub default_mode: ScheduleMode,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TimeDoctorConfig {
    #[serde(default)]
    pub email: String,
    pub password: Option<String>, // Legacy plain text, moved to keyring on load
    /// Optional API URL override (e.g. mocking)
    pub api_url: Option<String>,
    /// Optional second backend tried when the direct API is unreachable
    pub proxy_url: Option<String>,
    /// Optional v1.1 stats API override
    pub stats_api_url: Option<String>,
    /// Time Doctor display name to report for (defaults to the login user)
    pub user_name: Option<String>,
}

impl TimeDoctorConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_TD_API_URL)
    }

    pub fn stats_api_url(&self) -> &str {
        self.stats_api_url
            .as_deref()
            .unwrap_or(DEFAULT_TD_STATS_API_URL)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RamsConfig {
    #[serde(default)]
    pub username: String,
    pub password: Option<String>,
    #[serde(default = "default_rams_base_url")]
    pub base_url: String,
    /// Saved employee name used for auto-matching
    pub employee: Option<String>,
}

fn default_rams_base_url() -> String {
    DEFAULT_RAMS_BASE_URL.to_string()
}

impl Default for RamsConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            base_url: default_rams_base_url(),
            employee: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StateConfig {
    /// A session older than this is discarded
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u32,
    /// Cached Time Doctor tokens older than this are not reused
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
    /// Optional override for state directory (for testing)
    pub state_dir_override: Option<PathBuf>,
}

fn default_expiry_hours() -> u32 {
    12
}

fn default_token_ttl_hours() -> u32 {
    6
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            expiry_hours: default_expiry_hours(),
            token_ttl_hours: default_token_ttl_hours(),
            state_dir_override: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn validate_url(field: &str, url: Option<&str>) -> Result<()> {
    if let Some(url) = url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        anyhow::bail!("Invalid URL for {}: '{}'", field, url);
    }
    Ok(())
}

impl StateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.expiry_hours == 0 {
            anyhow::bail!("state.expiry_hours must be greater than 0");
        }
        if self.token_ttl_hours == 0 {
            anyhow::bail!("state.token_ttl_hours must be greater than 0");
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", self.level))?;
        Ok(())
    }
}

impl Config {
    /// Time Doctor password from keyring or config (with migration)
    pub fn time_doctor_password(&self) -> Result<String> {
        if let Ok(pw) = crate::keyring::get_time_doctor_password() {
            return Ok(pw);
        }

        if let Some(pw) = &self.time_doctor.password {
            return Ok(pw.clone());
        }

        anyhow::bail!(
            "Time Doctor password not found. Run 'shc config set time_doctor.password <PASSWORD>' to configure"
        )
    }

    /// RAMS password from keyring or config (with migration)
    pub fn rams_password(&self) -> Result<String> {
        if let Ok(pw) = crate::keyring::get_rams_password() {
            return Ok(pw);
        }

        if let Some(pw) = &self.rams.password {
            return Ok(pw.clone());
        }

        anyhow::bail!(
            "RAMS password not found. Run 'shc config set rams.password <PASSWORD>' to configure"
        )
    }

    /// Validate all configuration
    pub fn validate(&self) -> Result<()> {
        validate_url("time_doctor.api_url", self.time_doctor.api_url.as_deref())?;
        validate_url("time_doctor.proxy_url", self.time_doctor.proxy_url.as_deref())?;
        validate_url(
            "time_doctor.stats_api_url",
            self.time_doctor.stats_api_url.as_deref(),
        )?;
        validate_url("rams.base_url", Some(&self.rams.base_url))?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Move plain-text passwords into the keyring
    pub fn migrate_credentials(&mut self) -> Result<bool> {
        let mut migrated = false;

        if let Some(pw) = &self.time_doctor.password {
            crate::keyring::store_time_doctor_password(pw)
                .context("Failed to store Time Doctor password in keyring")?;
            self.time_doctor.password = None;
            migrated = true;
        }

        if let Some(pw) = &self.rams.password {
            crate::keyring::store_rams_password(pw)
                .context("Failed to store RAMS password in keyring")?;
            self.rams.password = None;
            migrated = true;
        }

        Ok(migrated)
    }
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(home::home_dir()
        .context("Could not find home directory")?
        .join(".shiftclock"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let loader = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .build()
        .context("Failed to build config loader")?;

    let config: Config = loader
        .try_deserialize()
        .context("Failed to parse config file")?;

    config.validate()?;
    Ok(config)
}

pub fn load() -> Result<Config> {
    let config_path = config_path()?;

    let mut config = load_from_path(&config_path)?;

    // A failing keyring backend must not make the config unusable
    match config.migrate_credentials() {
        Ok(true) => {
            tracing::info!("Migrated credentials to secure storage");
            save_to_path(&config, &config_path)?;
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!("Keeping credentials in config file: {:#}", e);
            config = load_from_path(&config_path)?;
        }
    }

    Ok(config)
}

pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path.as_ref(), toml_string).context("Failed to write config file")?;

    Ok(())
}

/// Set a dotted key in the raw TOML file, creating tables as needed.
///
/// Values parse as bool, then integer, then fall back to string.
pub fn set_value_in_file<P: AsRef<Path>>(path: P, key: &str, value: &str) -> Result<()> {
    let path = path.as_ref();
    let original = if path.exists() {
        Some(std::fs::read_to_string(path).context("Failed to read config file")?)
    } else {
        None
    };
    let mut table: toml::Table = match &original {
        Some(content) => content.parse().context("Failed to parse config file")?,
        None => toml::Table::new(),
    };

    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, tables) = parts
        .split_last()
        .context("Config key must not be empty")?;
    if leaf.is_empty() {
        anyhow::bail!("Invalid config key '{}'", key);
    }

    let mut current = &mut table;
    for part in tables {
        current = current
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .with_context(|| format!("Config key '{}' is not a table", part))?;
    }

    let parsed = if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else {
        toml::Value::String(value.to_string())
    };
    current.insert(leaf.to_string(), parsed);

    let content = toml::to_string_pretty(&table).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path, content).context("Failed to write config file")?;

    // Roll back rather than leave a config behind that no longer loads
    if let Err(e) = load_from_path(path) {
        let restored = match original {
            Some(content) => std::fs::write(path, content),
            None => std::fs::remove_file(path),
        };
        restored.context("Failed to restore config file")?;
        return Err(e.context(format!("Rejected config change {} = {}", key, value)));
    }
    Ok(())
}
