use crate::config::{self, Config};
use anyhow::{Context, Result};

const MASK: &str = "********";

/// Copy of the config with any plain-text passwords hidden.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.time_doctor.password.is_some() {
        shown.time_doctor.password = Some(MASK.to_string());
    }
    if shown.rams.password.is_some() {
        shown.rams.password = Some(MASK.to_string());
    }
    shown
}

pub fn list(config: &Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(&masked(config)).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

pub fn get(key: &str, config: &Config) -> Result<()> {
    // Walk the serialized form by dotted path
    let value = serde_json::to_value(masked(config)).context("Failed to serialize config")?;

    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("Key not found: {}", key))?;
    }

    match current {
        serde_json::Value::String(s) => println!("{}", s),
        serde_json::Value::Null => println!("(not set)"),
        v => println!("{}", v),
    }

    Ok(())
}

/// Passwords go to the keyring; only fall back to the file when it is unusable.
fn store_secret(key: &str, value: &str) -> bool {
    let stored = match key {
        "time_doctor.password" => crate::keyring::store_time_doctor_password(value),
        "rams.password" => crate::keyring::store_rams_password(value),
        _ => return false,
    };
    match stored {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Keyring unavailable, storing {} in config file: {:#}", key, e);
            false
        }
    }
}

pub fn set(key: &str, value: &str) -> Result<()> {
    if store_secret(key, value) {
        println!("✓ {} saved to system keyring", key);
        return Ok(());
    }

    let path = config::config_path()?;
    config::set_value_in_file(&path, key, value)?;

    if key.ends_with("password") {
        println!("✓ {} saved to {}", key, path.display());
    } else {
        println!("✓ {} = {}", key, value);
    }
    Ok(())
}
