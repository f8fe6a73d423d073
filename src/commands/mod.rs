pub mod config;
pub mod fetch;
pub mod session;
pub mod stats;
pub mod status;

use crate::OutputFormat;
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use std::path::PathBuf;

/// Lock and state file paths for this config.
pub(crate) fn state_paths(config: &Config) -> Result<(PathBuf, PathBuf)> {
    crate::platform::state_paths(config.state.state_dir_override.as_ref())
}

pub(crate) fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print `text` or the JSON form of `value` depending on the format.
pub(crate) fn emit<T: Serialize>(format: OutputFormat, value: &T, text: &str) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            println!("{}", text);
            Ok(())
        }
    }
}
