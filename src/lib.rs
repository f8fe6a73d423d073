pub mod commands;
pub mod config;
pub mod error;
pub mod keyring;
pub mod logging;
pub mod platform;
pub mod shift;
pub mod sources;
pub mod state;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
